// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Conversion-and-delivery pipeline
//!
//! Finished chunks flow writer -> encoder -> batch -> buffer; a fetch handler
//! drains the buffer from the consumer side in arrival order.

pub mod batch;
pub mod binary;
pub mod buffer;
pub mod encoder;
pub mod json;
pub mod writer;

// Re-export the main types for convenience
pub use batch::{EncodedRow, ResultBatch};
pub use buffer::{BufferControlBlock, Fetch};
pub use encoder::RowEncoder;
pub use writer::{ConvertMetrics, ResultWriter, StreamResultWriter};
