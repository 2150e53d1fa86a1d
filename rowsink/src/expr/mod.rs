// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Output expression evaluation seam
//!
//! The sink does not evaluate expressions itself; it consumes the execution
//! engine's expression layer through [`OutputExpr`]. Each expression produces
//! one result column per chunk, resolved once for the whole chunk before rows
//! are encoded.

use crate::chunk::{Chunk, Column};
use crate::error::SinkError;
use std::sync::Arc;

/// One evaluatable output column position
pub trait OutputExpr: Send + Sync {
    /// Declared output name, used as the row key in keyed formats
    fn output_name(&self) -> &str;

    /// Resolve this expression against every row of `chunk`
    fn evaluate(&self, chunk: &Chunk) -> Result<Column, SinkError>;
}

/// Ordered set of output expressions, one per output column position
///
/// Lifetime spans the whole query; owned by the caller and borrowed by the
/// result writer.
#[derive(Clone)]
pub struct OutputExprSet {
    exprs: Vec<Arc<dyn OutputExpr>>,
}

impl OutputExprSet {
    pub fn new(exprs: Vec<Arc<dyn OutputExpr>>) -> Self {
        Self { exprs }
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Declared output names, in column order
    pub fn output_names(&self) -> Vec<&str> {
        self.exprs.iter().map(|e| e.output_name()).collect()
    }

    /// Evaluate every expression against `chunk`, producing one column per
    /// output position. Every produced column must match the chunk row count.
    pub fn evaluate(&self, chunk: &Chunk) -> Result<Vec<Column>, SinkError> {
        let mut columns = Vec::with_capacity(self.exprs.len());
        for expr in &self.exprs {
            let column = expr.evaluate(chunk)?;
            if column.len() != chunk.num_rows() {
                return Err(SinkError::Expression(format!(
                    "expression '{}' produced {} rows for a {}-row chunk",
                    expr.output_name(),
                    column.len(),
                    chunk.num_rows()
                )));
            }
            columns.push(column);
        }
        Ok(columns)
    }
}

/// Column reference expression: projects an input column through unchanged
///
/// The simplest expression the engine hands us; also what tests drive the
/// pipeline with.
pub struct ColumnRef {
    name: String,
    column_index: usize,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>, column_index: usize) -> Self {
        Self {
            name: name.into(),
            column_index,
        }
    }
}

impl OutputExpr for ColumnRef {
    fn output_name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, chunk: &Chunk) -> Result<Column, SinkError> {
        if self.column_index >= chunk.num_columns() {
            return Err(SinkError::Expression(format!(
                "column reference {} out of range for {}-column chunk",
                self.column_index,
                chunk.num_columns()
            )));
        }
        Ok(chunk.column(self.column_index).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{DataType, Datum};

    fn int_chunk() -> Chunk {
        Chunk::new(vec![Column::new(
            DataType::Int,
            vec![Datum::Int(1), Datum::Int(2)],
        )])
        .unwrap()
    }

    #[test]
    fn test_column_ref_projects_input() {
        let chunk = int_chunk();
        let expr = ColumnRef::new("id", 0);
        let col = expr.evaluate(&chunk).unwrap();
        assert_eq!(col.len(), 2);
        assert_eq!(col.value(1), &Datum::Int(2));
    }

    #[test]
    fn test_column_ref_out_of_range() {
        let chunk = int_chunk();
        let expr = ColumnRef::new("missing", 3);
        assert!(matches!(
            expr.evaluate(&chunk),
            Err(SinkError::Expression(_))
        ));
    }

    #[test]
    fn test_expr_set_row_count_mismatch() {
        struct BadExpr;
        impl OutputExpr for BadExpr {
            fn output_name(&self) -> &str {
                "bad"
            }
            fn evaluate(&self, _chunk: &Chunk) -> Result<Column, SinkError> {
                Ok(Column::new(DataType::Int, vec![Datum::Int(1)]))
            }
        }

        let set = OutputExprSet::new(vec![Arc::new(BadExpr)]);
        assert!(matches!(
            set.evaluate(&int_chunk()),
            Err(SinkError::Expression(_))
        ));
    }
}
