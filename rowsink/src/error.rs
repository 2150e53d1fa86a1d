// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Result-sink error types

use thiserror::Error;

/// Errors surfaced by the conversion-and-delivery pipeline
///
/// A fetch timeout is deliberately not represented here: `BufferControlBlock::get`
/// reports it through [`crate::sink::buffer::Fetch::TimedOut`] so callers can
/// retry or poll for cancellation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Expression evaluation error: {0}")]
    Expression(String),

    #[error("Memory limit exceeded: requested {requested} bytes, limit {limit} bytes")]
    MemoryLimitExceeded { limit: usize, requested: usize },

    #[error("Query cancelled")]
    Cancelled,

    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

impl SinkError {
    /// Cancellation is expected stream termination, not a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SinkError::Cancelled)
    }
}
