// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! RowSink - Bounded result-stream delivery for a distributed query engine
//!
//! RowSink sits between query execution and the client-facing fetch protocol:
//! it converts finished columnar result chunks into serialized wire rows and
//! delivers them through a bounded, backpressure-aware channel.
//!
//! # Features
//!
//! - **Row conversion**: columnar chunks become JSON or binary row records,
//!   with a reusable scratch buffer and a hard per-row size cap
//! - **Bounded delivery**: a per-query [`BufferControlBlock`] bounds buffered
//!   memory by bytes and batch count, blocking the producer instead of
//!   dropping data
//! - **Ordering**: batches arrive at the consumer in exactly the order they
//!   were enqueued, with gapless sequence numbers
//! - **Cancellation**: cancelling a query wakes every blocked producer and
//!   consumer immediately
//!
//! # Usage
//!
//! ```ignore
//! let config = SinkConfig::default();
//! let channel = Arc::new(BufferControlBlock::new(
//!     config.channel_byte_cap,
//!     config.channel_batch_cap,
//! ));
//! let mut writer = StreamResultWriter::new(&config, output_exprs, Arc::clone(&channel));
//! writer.init(&budget)?;
//!
//! // Execution side
//! writer.append_chunk(&chunk)?;
//! writer.finish();
//!
//! // Fetch-handler side
//! while let Fetch::Batch(batch) = channel.get(timeout)? {
//!     ship(batch);
//! }
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod expr;
pub mod memory;
pub mod sink;

// Re-export the public API
pub use chunk::{Chunk, Column, DataType, Datum};
pub use config::{ResultFormat, SinkConfig};
pub use error::SinkError;
pub use expr::{ColumnRef, OutputExpr, OutputExprSet};
pub use memory::MemoryBudget;
pub use sink::{
    BufferControlBlock, ConvertMetrics, EncodedRow, Fetch, ResultBatch, ResultWriter,
    StreamResultWriter,
};

/// RowSink version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
