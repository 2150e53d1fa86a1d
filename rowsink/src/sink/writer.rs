// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-query result writer
//!
//! Owns the conversion pipeline for one query's result stream: evaluates the
//! output expressions against each finished chunk, encodes rows in the
//! configured wire format, and hands the resulting batches to the
//! [`BufferControlBlock`] under backpressure.

use crate::chunk::Chunk;
use crate::config::SinkConfig;
use crate::error::SinkError;
use crate::expr::OutputExprSet;
use crate::memory::MemoryBudget;
use crate::sink::batch::{EncodedRow, ResultBatch};
use crate::sink::buffer::BufferControlBlock;
use crate::sink::encoder::{encoder_for, RowEncoder};
use log::debug;
use std::sync::Arc;
use std::time::Instant;

/// Initial scratch capacity; the buffer grows on demand up to the row cap
const INITIAL_SCRATCH_CAPACITY: usize = 4096;

/// Lifecycle contract every format variant of the result writer satisfies
pub trait ResultWriter {
    /// Reserve worst-case scratch memory against the process budget
    fn init(&mut self, budget: &MemoryBudget) -> Result<(), SinkError>;

    /// Convert `chunk` and enqueue the resulting batches, blocking under
    /// backpressure
    fn append_chunk(&mut self, chunk: &Chunk) -> Result<(), SinkError>;

    /// Pure conversion with no channel side effect; repeatable for the same
    /// input
    fn process_chunk(&mut self, chunk: &Chunk) -> Result<Vec<ResultBatch>, SinkError>;
}

/// Conversion counters for one writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertMetrics {
    pub chunks_converted: u64,
    pub rows_converted: u64,
    pub bytes_produced: u64,
    pub convert_ns: u128,
}

/// Result writer delivering into a shared [`BufferControlBlock`]
///
/// The format variant is fixed at construction from [`SinkConfig::format`];
/// variants differ only in the row-encoding rule.
pub struct StreamResultWriter {
    sinker: Arc<BufferControlBlock>,
    output_exprs: OutputExprSet,
    encoder: Box<dyn RowEncoder>,
    row_buf: Vec<u8>,
    max_row_buffer_size: usize,
    batch_flush_rows: usize,
    budget: Option<MemoryBudget>,
    reserved: usize,
    metrics: ConvertMetrics,
}

impl StreamResultWriter {
    pub fn new(
        config: &SinkConfig,
        output_exprs: OutputExprSet,
        sinker: Arc<BufferControlBlock>,
    ) -> Self {
        Self {
            sinker,
            output_exprs,
            encoder: encoder_for(config.format, config.max_row_buffer_size),
            row_buf: Vec::new(),
            max_row_buffer_size: config.max_row_buffer_size,
            batch_flush_rows: config.batch_flush_rows.max(1),
            budget: None,
            reserved: 0,
            metrics: ConvertMetrics::default(),
        }
    }

    /// Signal that this query will produce no further chunks
    pub fn finish(&self) {
        self.sinker.close_producer();
    }

    pub fn metrics(&self) -> ConvertMetrics {
        self.metrics
    }
}

impl ResultWriter for StreamResultWriter {
    fn init(&mut self, budget: &MemoryBudget) -> Result<(), SinkError> {
        if self.reserved > 0 {
            return Ok(());
        }
        // Reserve the worst-case row up front so a pathological row fails the
        // query at init time, not deep into execution.
        budget.reserve(self.max_row_buffer_size)?;
        self.budget = Some(budget.clone());
        self.reserved = self.max_row_buffer_size;
        self.row_buf
            .reserve(INITIAL_SCRATCH_CAPACITY.min(self.max_row_buffer_size));
        Ok(())
    }

    fn append_chunk(&mut self, chunk: &Chunk) -> Result<(), SinkError> {
        let batches = match self.process_chunk(chunk) {
            Ok(batches) => batches,
            Err(err) => {
                // Fail the channel too, so the consumer observes the same
                // error instead of waiting out its timeout.
                if !err.is_cancelled() {
                    self.sinker.abort(err.clone());
                }
                return Err(err);
            }
        };
        for batch in batches {
            self.sinker.put(batch)?;
        }
        Ok(())
    }

    fn process_chunk(&mut self, chunk: &Chunk) -> Result<Vec<ResultBatch>, SinkError> {
        let start = Instant::now();
        let columns = self.output_exprs.evaluate(chunk)?;
        let names = self.output_exprs.output_names();

        let mut batches = Vec::new();
        let mut rows: Vec<EncodedRow> =
            Vec::with_capacity(chunk.num_rows().min(self.batch_flush_rows));
        let mut bytes_produced = 0u64;
        for idx in 0..chunk.num_rows() {
            // Reset, never reallocate, between rows
            self.row_buf.clear();
            if let Err(err) = self.encoder.encode_row(&names, &columns, idx, &mut self.row_buf) {
                // A failed row must not leak into the next encoding attempt
                self.row_buf.clear();
                return Err(err);
            }
            bytes_produced += self.row_buf.len() as u64;
            rows.push(EncodedRow::new(self.row_buf.clone()));
            if rows.len() >= self.batch_flush_rows {
                batches.push(ResultBatch::new(std::mem::take(&mut rows)));
            }
        }
        if !rows.is_empty() {
            batches.push(ResultBatch::new(rows));
        }

        let elapsed = start.elapsed();
        self.metrics.chunks_converted += 1;
        self.metrics.rows_converted += chunk.num_rows() as u64;
        self.metrics.bytes_produced += bytes_produced;
        self.metrics.convert_ns += elapsed.as_nanos();
        debug!(
            "converted chunk for stream {}: {} rows, {} bytes, {} batches in {:?}",
            self.sinker.stream_id(),
            chunk.num_rows(),
            bytes_produced,
            batches.len(),
            elapsed
        );
        Ok(batches)
    }
}

impl Drop for StreamResultWriter {
    fn drop(&mut self) {
        if let Some(budget) = self.budget.take() {
            budget.release(self.reserved);
        }
    }
}
