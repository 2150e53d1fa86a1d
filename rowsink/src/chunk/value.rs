// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Datum type system for result cells
//!
//! Covers the closed set of scalar and composite types a result column may
//! hold:
//! - Basic types: Boolean, Int, Float, String, Bytes
//! - Temporal types: Date, Timestamp
//! - Composites: Array, Map, Struct

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single result cell value
///
/// `Null` appears only inside composites; top-level nullability is tracked by
/// the owning [`super::Column`]'s per-row null indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Datum {
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Array(Vec<Datum>),
    Map(Vec<(Datum, Datum)>),
    Struct(Vec<(String, Datum)>),
    Null,
}

/// Declared type of a result column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int,
    Float,
    String,
    Bytes,
    Date,
    Timestamp,
    Array,
    Map,
    Struct,
}

impl Datum {
    /// Declared type of this datum, if it has one (`Null` does not)
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Datum::Boolean(_) => Some(DataType::Boolean),
            Datum::Int(_) => Some(DataType::Int),
            Datum::Float(_) => Some(DataType::Float),
            Datum::String(_) => Some(DataType::String),
            Datum::Bytes(_) => Some(DataType::Bytes),
            Datum::Date(_) => Some(DataType::Date),
            Datum::Timestamp(_) => Some(DataType::Timestamp),
            Datum::Array(_) => Some(DataType::Array),
            Datum::Map(_) => Some(DataType::Map),
            Datum::Struct(_) => Some(DataType::Struct),
            Datum::Null => None,
        }
    }

    /// Extract as integer if possible
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Datum::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract as float if possible
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Datum::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract as string if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract as boolean if possible
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Datum::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Check for the nested null marker
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Int => "INT",
            DataType::Float => "FLOAT",
            DataType::String => "STRING",
            DataType::Bytes => "BYTES",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Array => "ARRAY",
            DataType::Map => "MAP",
            DataType::Struct => "STRUCT",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datum_accessors() {
        assert_eq!(Datum::Int(7).as_int(), Some(7));
        assert_eq!(Datum::Float(1.5).as_float(), Some(1.5));
        assert_eq!(Datum::String("a".to_string()).as_str(), Some("a"));
        assert_eq!(Datum::Boolean(true).as_boolean(), Some(true));
        assert!(Datum::Null.is_null());
        assert_eq!(Datum::Int(7).as_str(), None);
    }

    #[test]
    fn test_data_type_of_composites() {
        let arr = Datum::Array(vec![Datum::Int(1), Datum::Null]);
        assert_eq!(arr.data_type(), Some(DataType::Array));
        assert_eq!(Datum::Null.data_type(), None);
    }
}
