// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! JSON row format
//!
//! Encodes one row as a single JSON object: `{"name":value,...}` with one
//! member per output column position. Encoding rules:
//! - integers and floats emit canonical numeric literals (floats through
//!   serde_json's shortest round-trippable form; non-finite floats are an
//!   encoding error, JSON has no literal for them)
//! - strings are JSON-escaped and quoted; booleans emit `true`/`false`
//! - dates emit `YYYY-MM-DD`, timestamps RFC 3339 UTC, both as strings
//! - bytes emit as a string with non-printable bytes escaped `\u00XX`,
//!   round-trippable at the byte level
//! - arrays, maps and structs recurse with the same rules; map keys are
//!   rendered as strings
//! - a set null indicator emits the literal `null`

use crate::chunk::{Column, Datum};
use crate::error::SinkError;
use crate::sink::encoder::RowEncoder;
use chrono::SecondsFormat;

pub struct JsonRowEncoder {
    max_row_bytes: usize,
}

impl JsonRowEncoder {
    pub fn new(max_row_bytes: usize) -> Self {
        Self { max_row_bytes }
    }

    fn check_cap(&self, buf: &[u8]) -> Result<(), SinkError> {
        if buf.len() > self.max_row_bytes {
            return Err(SinkError::Encoding(format!(
                "encoded row exceeds maximum row size of {} bytes",
                self.max_row_bytes
            )));
        }
        Ok(())
    }

    fn write_str(s: &str, buf: &mut Vec<u8>) -> Result<(), SinkError> {
        serde_json::to_writer(&mut *buf, s)
            .map_err(|e| SinkError::Encoding(format!("string encoding failed: {}", e)))
    }

    fn write_bytes(bytes: &[u8], buf: &mut Vec<u8>) {
        buf.push(b'"');
        for &b in bytes {
            match b {
                b'"' => buf.extend_from_slice(b"\\\""),
                b'\\' => buf.extend_from_slice(b"\\\\"),
                0x20..=0x7e => buf.push(b),
                _ => {
                    const HEX: &[u8; 16] = b"0123456789abcdef";
                    buf.extend_from_slice(b"\\u00");
                    buf.push(HEX[(b >> 4) as usize]);
                    buf.push(HEX[(b & 0x0f) as usize]);
                }
            }
        }
        buf.push(b'"');
    }

    /// Map keys are always rendered as JSON strings
    fn write_map_key(&self, key: &Datum, buf: &mut Vec<u8>) -> Result<(), SinkError> {
        match key {
            Datum::String(s) => Self::write_str(s, buf),
            Datum::Boolean(b) => Self::write_str(if *b { "true" } else { "false" }, buf),
            Datum::Int(v) => Self::write_str(&v.to_string(), buf),
            Datum::Float(v) => Self::write_str(&v.to_string(), buf),
            Datum::Date(d) => Self::write_str(&d.format("%Y-%m-%d").to_string(), buf),
            Datum::Timestamp(ts) => {
                Self::write_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true), buf)
            }
            other => Err(SinkError::Encoding(format!(
                "unsupported map key type: {:?}",
                other.data_type()
            ))),
        }
    }

    fn write_cell(&self, datum: &Datum, buf: &mut Vec<u8>) -> Result<(), SinkError> {
        match datum {
            Datum::Null => buf.extend_from_slice(b"null"),
            Datum::Boolean(b) => {
                buf.extend_from_slice(if *b { b"true" } else { b"false" });
            }
            Datum::Int(v) => serde_json::to_writer(&mut *buf, v)
                .map_err(|e| SinkError::Encoding(format!("integer encoding failed: {}", e)))?,
            Datum::Float(v) => {
                if !v.is_finite() {
                    return Err(SinkError::Encoding(format!(
                        "non-finite float {} has no JSON representation",
                        v
                    )));
                }
                serde_json::to_writer(&mut *buf, v)
                    .map_err(|e| SinkError::Encoding(format!("float encoding failed: {}", e)))?;
            }
            Datum::String(s) => Self::write_str(s, buf)?,
            Datum::Bytes(bytes) => Self::write_bytes(bytes, buf),
            Datum::Date(d) => Self::write_str(&d.format("%Y-%m-%d").to_string(), buf)?,
            Datum::Timestamp(ts) => {
                Self::write_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true), buf)?;
            }
            Datum::Array(items) => {
                buf.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push(b',');
                    }
                    self.write_cell(item, buf)?;
                    self.check_cap(buf)?;
                }
                buf.push(b']');
            }
            Datum::Map(entries) => {
                buf.push(b'{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        buf.push(b',');
                    }
                    self.write_map_key(key, buf)?;
                    buf.push(b':');
                    self.write_cell(value, buf)?;
                    self.check_cap(buf)?;
                }
                buf.push(b'}');
            }
            Datum::Struct(fields) => {
                buf.push(b'{');
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        buf.push(b',');
                    }
                    Self::write_str(name, buf)?;
                    buf.push(b':');
                    self.write_cell(value, buf)?;
                    self.check_cap(buf)?;
                }
                buf.push(b'}');
            }
        }
        Ok(())
    }
}

impl RowEncoder for JsonRowEncoder {
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

        buf.push(b'{');
        for (i, (name, column)) in names.iter().zip(columns.iter()).enumerate() {
            if i > 0 {
                buf.push(b',');
            }
            Self::write_str(name, buf)?;
            buf.push(b':');
            if column.is_null(idx) {
                buf.extend_from_slice(b"null");
            } else {
                self.write_cell(column.value(idx), buf)?;
            }
            self.check_cap(buf)?;
        }
        buf.push(b'}');
        self.check_cap(buf)
    }
}
