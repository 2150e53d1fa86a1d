// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Columnar result batches
//!
//! A [`Chunk`] is an immutable, read-only batch of query result rows produced
//! by the execution engine. It is lent to the result writer for the duration
//! of one conversion call; the writer must not retain it afterward.

pub mod value;

pub use value::{DataType, Datum};

use crate::error::SinkError;

/// One column vector: N values of a declared type plus a per-row null
/// indicator. An empty `nulls` vector means no row is null.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    data_type: DataType,
    values: Vec<Datum>,
    nulls: Vec<bool>,
}

impl Column {
    /// Create a non-nullable column
    pub fn new(data_type: DataType, values: Vec<Datum>) -> Self {
        Self {
            data_type,
            values,
            nulls: Vec::new(),
        }
    }

    /// Create a nullable column
    ///
    /// `nulls` must be empty or the same length as `values`.
    pub fn nullable(
        data_type: DataType,
        values: Vec<Datum>,
        nulls: Vec<bool>,
    ) -> Result<Self, SinkError> {
        if !nulls.is_empty() && nulls.len() != values.len() {
            return Err(SinkError::Encoding(format!(
                "null indicator length {} does not match value count {}",
                nulls.len(),
                values.len()
            )));
        }
        Ok(Self {
            data_type,
            values,
            nulls,
        })
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check the null indicator for a row
    pub fn is_null(&self, idx: usize) -> bool {
        self.nulls.get(idx).copied().unwrap_or(false)
    }

    /// Read the value at a row. Callers check `is_null` first; the stored
    /// datum for a null row is unspecified.
    pub fn value(&self, idx: usize) -> &Datum {
        &self.values[idx]
    }
}

/// An immutable columnar batch of query result rows
///
/// All columns have the same length. Ownership stays with the execution
/// engine; the sink borrows it per conversion call.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Chunk {
    /// Build a chunk from column vectors, validating equal lengths
    pub fn new(columns: Vec<Column>) -> Result<Self, SinkError> {
        let num_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        for (i, col) in columns.iter().enumerate() {
            if col.len() != num_rows {
                return Err(SinkError::Encoding(format!(
                    "column {} has {} rows, expected {}",
                    i,
                    col.len(),
                    num_rows
                )));
            }
        }
        Ok(Self { columns, num_rows })
    }

    /// An empty chunk with no columns and no rows
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            num_rows: 0,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> &Column {
        &self.columns[idx]
    }
}
