// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Binary row format
//!
//! Sibling of the JSON variant sharing the same [`RowEncoder`] contract. One
//! row is the bincode encoding of its cells in output-column order, each cell
//! an `Option<Datum>` with `None` for a set null indicator.

use crate::chunk::{Column, Datum};
use crate::error::SinkError;
use crate::sink::encoder::RowEncoder;

pub struct BinaryRowEncoder {
    max_row_bytes: usize,
}

impl BinaryRowEncoder {
    pub fn new(max_row_bytes: usize) -> Self {
        Self { max_row_bytes }
    }
}

impl RowEncoder for BinaryRowEncoder {
    fn encode_row(
        &self,
        names: &[&str],
        columns: &[Column],
        idx: usize,
        buf: &mut Vec<u8>,
    ) -> Result<(), SinkError> {
        if names.len() != columns.len() {
            return Err(SinkError::Encoding(format!(
                "{} output names for {} result columns",
                names.len(),
                columns.len()
            )));
        }

        let cells: Vec<Option<&Datum>> = columns
            .iter()
            .map(|column| {
                if column.is_null(idx) {
                    None
                } else {
                    Some(column.value(idx))
                }
            })
            .collect();

        bincode::serialize_into(&mut *buf, &cells)
            .map_err(|e| SinkError::Encoding(format!("binary row encoding failed: {}", e)))?;

        if buf.len() > self.max_row_bytes {
            return Err(SinkError::Encoding(format!(
                "encoded row exceeds maximum row size of {} bytes",
                self.max_row_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::DataType;

    #[test]
    fn test_binary_round_trip() {
        let columns = vec![
            Column::new(DataType::Int, vec![Datum::Int(42)]),
            Column::nullable(DataType::String, vec![Datum::Null], vec![true]).unwrap(),
        ];
        let encoder = BinaryRowEncoder::new(1024);
        let mut buf = Vec::new();
        encoder.encode_row(&["id", "name"], &columns, 0, &mut buf).unwrap();

        let cells: Vec<Option<Datum>> = bincode::deserialize(&buf).unwrap();
        assert_eq!(cells, vec![Some(Datum::Int(42)), None]);
    }

    #[test]
    fn test_binary_row_size_cap() {
        let columns = vec![Column::new(
            DataType::Bytes,
            vec![Datum::Bytes(vec![0u8; 256])],
        )];
        let encoder = BinaryRowEncoder::new(32);
        let mut buf = Vec::new();
        assert!(matches!(
            encoder.encode_row(&["b"], &columns, 0, &mut buf),
            Err(SinkError::Encoding(_))
        ));
    }
}
