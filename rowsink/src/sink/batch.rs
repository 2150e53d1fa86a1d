// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Wire-format result batches

/// One serialized output row: an opaque payload plus its byte length
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    data: Vec<u8>,
}

impl EncodedRow {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// An ordered group of serialized rows, the unit handed to the channel
///
/// `sequence` is 0 until the channel stamps it on admission; delivered
/// batches carry strictly increasing sequence numbers with no gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBatch {
    rows: Vec<EncodedRow>,
    byte_size: usize,
    sequence: u64,
    eos: bool,
}

impl ResultBatch {
    pub fn new(rows: Vec<EncodedRow>) -> Self {
        let byte_size = rows.iter().map(|r| r.len()).sum();
        Self {
            rows,
            byte_size,
            sequence: 0,
            eos: false,
        }
    }

    /// An empty terminal batch, used when end-of-stream carries no rows
    pub fn eos() -> Self {
        let mut batch = Self::new(Vec::new());
        batch.eos = true;
        batch
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn rows(&self) -> &[EncodedRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<EncodedRow> {
        self.rows
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_eos(&self) -> bool {
        self.eos
    }

    pub fn mark_eos(&mut self) {
        self.eos = true;
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }
}
