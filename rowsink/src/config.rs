// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Sink configuration surface

use serde::{Deserialize, Serialize};

/// Wire format selector for the result stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    /// One JSON object per row
    #[default]
    Json,
    /// Length-delimited binary row records
    Binary,
}

/// Configuration consumed by the conversion-and-delivery pipeline
///
/// All fields have production defaults; deserialization fills missing fields
/// from [`SinkConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Output format, fixed at writer construction
    pub format: ResultFormat,

    /// Hard cap on one encoded row. A row that would exceed this fails with
    /// an encoding error instead of being truncated.
    pub max_row_buffer_size: usize,

    /// Channel cap on total buffered batch bytes
    pub channel_byte_cap: usize,

    /// Channel cap on buffered batch count
    pub channel_batch_cap: usize,

    /// Row count at which a chunk's output is split into a new batch
    pub batch_flush_rows: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            format: ResultFormat::Json,
            max_row_buffer_size: 1024 * 1024 * 1024,
            channel_byte_cap: 16 * 1024 * 1024,
            channel_batch_cap: 64,
            batch_flush_rows: 4096,
        }
    }
}
