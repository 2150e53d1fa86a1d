// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Process memory budget for sink allocations
//!
//! Writers reserve their worst-case scratch capacity here before converting
//! anything, so a pathological configuration fails at init instead of at row
//! ten million.

use crate::error::SinkError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared memory budget tracker
///
/// Thread safe; clones share the same counters. A writer that fails to
/// reserve gets `MemoryLimitExceeded` and must not allocate its scratch.
#[derive(Clone)]
pub struct MemoryBudget {
    /// Maximum allowed memory in bytes
    limit: usize,

    /// Currently reserved memory
    reserved: Arc<AtomicUsize>,

    /// Peak reserved memory, for diagnostics
    peak: Arc<AtomicUsize>,
}

impl std::fmt::Debug for MemoryBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBudget")
            .field("limit", &self.limit)
            .field("reserved", &self.reserved.load(Ordering::SeqCst))
            .field("peak", &self.peak.load(Ordering::SeqCst))
            .finish()
    }
}

impl MemoryBudget {
    /// Create a budget with the given byte limit
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            reserved: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A budget that never rejects (tests, admin queries)
    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    /// Reserve `bytes` from the budget
    pub fn reserve(&self, bytes: usize) -> Result<(), SinkError> {
        let current = self.reserved.fetch_add(bytes, Ordering::SeqCst);
        let new_total = current.saturating_add(bytes);
        self.peak.fetch_max(new_total, Ordering::SeqCst);

        if new_total > self.limit {
            // Roll back the failed reservation
            self.reserved.fetch_sub(bytes, Ordering::SeqCst);
            return Err(SinkError::MemoryLimitExceeded {
                limit: self.limit,
                requested: new_total,
            });
        }

        Ok(())
    }

    /// Return `bytes` to the budget
    ///
    /// Callers release exactly what they reserved.
    pub fn release(&self, bytes: usize) {
        self.reserved.fetch_sub(bytes, Ordering::SeqCst);
    }

    /// Currently reserved bytes
    pub fn reserved(&self) -> usize {
        self.reserved.load(Ordering::SeqCst)
    }

    /// Peak reserved bytes
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Configured limit in bytes
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes still available
    pub fn available(&self) -> usize {
        self.limit.saturating_sub(self.reserved())
    }
}
