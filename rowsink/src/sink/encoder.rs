// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-format row encoding seam
//!
//! A [`RowEncoder`] turns one row of evaluated result columns into a single
//! wire-format record inside a caller-owned scratch buffer. The concrete
//! encoder is picked once, at writer construction, from the configured
//! [`ResultFormat`]; formats differ only in their cell-encoding rules.

use crate::chunk::Column;
use crate::config::ResultFormat;
use crate::error::SinkError;
use crate::sink::binary::BinaryRowEncoder;
use crate::sink::json::JsonRowEncoder;

/// Format-specific rule for turning one row's column values into a record
pub trait RowEncoder: Send {
    /// Encode the row at `idx` into `buf`
    ///
    /// `buf` arrives cleared and is only valid until the next call; the
    /// encoder must fail with an encoding error, never truncate, when the
    /// assembled row would exceed the configured row byte cap. `names` and
    /// `columns` are parallel, one entry per output column position.
    fn encode_row(
        &self,
        names: &[&str],
        columns: &[Column],
        idx: usize,
        buf: &mut Vec<u8>,
    ) -> Result<(), SinkError>;
}

/// Build the encoder for a configured format and row byte cap
pub fn encoder_for(format: ResultFormat, max_row_bytes: usize) -> Box<dyn RowEncoder> {
    match format {
        ResultFormat::Json => Box::new(JsonRowEncoder::new(max_row_bytes)),
        ResultFormat::Binary => Box::new(BinaryRowEncoder::new(max_row_bytes)),
    }
}
