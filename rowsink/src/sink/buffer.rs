// Copyright (c) 2024-2025 RowSink Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Bounded, ordered, cancellable batch channel
//!
//! The hand-off point between result production and result delivery. One
//! channel exists per query, shared by producer (execution) threads and
//! consumer (fetch-handler) threads, and bounds buffered memory by both byte
//! size and batch count. Producers block when the channel is full; dropping
//! batches is never an option because the result set must arrive complete and
//! in order.
//!
//! State machine: `Open -> {Draining | Cancelled | Error} -> Closed`. The
//! first terminal transition wins; cancellation and abort wake every blocked
//! thread immediately instead of letting them ride out a timeout.

use crate::error::SinkError;
use crate::sink::batch::ResultBatch;
use log::{debug, warn};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Outcome of a fetch attempt
///
/// A timeout is a retry signal, not an error; end-of-stream is observed
/// exactly once.
#[derive(Debug, PartialEq)]
pub enum Fetch {
    Batch(ResultBatch),
    Eos,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    Open,
    Draining,
    Cancelled,
    Error,
    Closed,
}

struct Inner {
    state: ChannelState,
    queue: VecDeque<ResultBatch>,
    buffered_bytes: usize,
    next_sequence: u64,
    error: Option<SinkError>,
}

/// Bounded producer/consumer buffer for one query's result stream
pub struct BufferControlBlock {
    stream_id: Uuid,
    byte_cap: usize,
    batch_cap: usize,
    inner: Mutex<Inner>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl BufferControlBlock {
    /// Create a channel bounded by `byte_cap` buffered bytes and `batch_cap`
    /// buffered batches
    pub fn new(byte_cap: usize, batch_cap: usize) -> Self {
        Self {
            stream_id: Uuid::new_v4(),
            byte_cap,
            batch_cap: batch_cap.max(1),
            inner: Mutex::new(Inner {
                state: ChannelState::Open,
                queue: VecDeque::new(),
                buffered_bytes: 0,
                next_sequence: 0,
                error: None,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    /// Buffered batch count at this instant
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }

    /// Buffered bytes at this instant
    pub fn buffered_bytes(&self) -> usize {
        self.inner.lock().buffered_bytes
    }

    fn closed_error(inner: &Inner) -> SinkError {
        match inner.state {
            ChannelState::Cancelled => SinkError::Cancelled,
            ChannelState::Error => inner
                .error
                .clone()
                .unwrap_or_else(|| SinkError::ChannelClosed("channel in error state".to_string())),
            _ => SinkError::ChannelClosed("producer side already closed".to_string()),
        }
    }

    /// Enqueue a batch, blocking while admitting it would exceed the byte or
    /// count cap
    ///
    /// A batch larger than the byte cap is admitted once the queue is empty;
    /// blocking it forever would wedge a result stream that must be delivered
    /// completely. Fails without blocking when the channel no longer accepts
    /// batches. On success the batch is stamped with the next sequence
    /// number.
    pub fn put(&self, mut batch: ResultBatch) -> Result<(), SinkError> {
        let mut inner = self.inner.lock();
        loop {
            if inner.state != ChannelState::Open {
                return Err(Self::closed_error(&inner));
            }
            let over_bytes = inner.buffered_bytes.saturating_add(batch.byte_size()) > self.byte_cap;
            let over_count = inner.queue.len() >= self.batch_cap;
            if inner.queue.is_empty() || (!over_bytes && !over_count) {
                break;
            }
            self.not_full.wait(&mut inner);
        }

        batch.set_sequence(inner.next_sequence);
        inner.next_sequence += 1;
        inner.buffered_bytes += batch.byte_size();
        inner.queue.push_back(batch);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Dequeue the next batch in enqueue order, waiting up to `timeout`
    ///
    /// Returns [`Fetch::TimedOut`] when the deadline passes with the stream
    /// still live, and [`Fetch::Eos`] exactly once when the producer has
    /// closed and the queue has drained; afterwards the channel is `Closed`
    /// and further calls are a contract violation. Cancellation and producer
    /// errors surface as the corresponding [`SinkError`].
    pub fn get(&self, timeout: Duration) -> Result<Fetch, SinkError> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        loop {
            if let Some(mut batch) = inner.queue.pop_front() {
                inner.buffered_bytes -= batch.byte_size();
                // Advisory: lets the consumer stop without one more round trip
                if inner.state == ChannelState::Draining && inner.queue.is_empty() {
                    batch.mark_eos();
                }
                self.not_full.notify_one();
                return Ok(Fetch::Batch(batch));
            }

            match inner.state {
                ChannelState::Cancelled => return Err(SinkError::Cancelled),
                ChannelState::Error => return Err(Self::closed_error(&inner)),
                ChannelState::Draining => {
                    inner.state = ChannelState::Closed;
                    debug!("result stream {} closed after end-of-stream", self.stream_id);
                    self.not_full.notify_all();
                    return Ok(Fetch::Eos);
                }
                ChannelState::Closed => {
                    return Err(SinkError::ChannelClosed(
                        "result stream already closed".to_string(),
                    ));
                }
                ChannelState::Open => {}
            }

            if Instant::now() >= deadline {
                return Ok(Fetch::TimedOut);
            }
            let _ = self.not_empty.wait_until(&mut inner, deadline);
        }
    }

    /// Signal that no further `put` calls will occur
    ///
    /// Idempotent. Remaining batches stay fetchable; the consumer observes
    /// end-of-stream once the queue drains.
    pub fn close_producer(&self) {
        let mut inner = self.inner.lock();
        if inner.state == ChannelState::Open {
            inner.state = ChannelState::Draining;
            debug!(
                "result stream {} draining, {} batches pending",
                self.stream_id,
                inner.queue.len()
            );
            self.not_empty.notify_all();
            self.not_full.notify_all();
        }
    }

    /// Cancel the stream, discarding buffered batches and waking every
    /// blocked producer and consumer
    ///
    /// Idempotent; a no-op once a terminal state has been reached.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            ChannelState::Open | ChannelState::Draining => {}
            ChannelState::Cancelled | ChannelState::Error | ChannelState::Closed => return,
        }
        inner.state = ChannelState::Cancelled;
        inner.queue.clear();
        inner.buffered_bytes = 0;
        debug!("result stream {} cancelled", self.stream_id);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Fail the stream so the consumer observes `error` instead of stalling
    ///
    /// Used by the producer side when conversion fails mid-query. Buffered
    /// batches are discarded; the stored error is returned by every later
    /// `put` or `get`.
    pub fn abort(&self, error: SinkError) {
        let mut inner = self.inner.lock();
        match inner.state {
            ChannelState::Open | ChannelState::Draining => {}
            ChannelState::Cancelled | ChannelState::Error | ChannelState::Closed => return,
        }
        warn!("result stream {} aborted: {}", self.stream_id, error);
        inner.state = ChannelState::Error;
        inner.error = Some(error);
        inner.queue.clear();
        inner.buffered_bytes = 0;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::batch::EncodedRow;
    use std::sync::Arc;
    use std::thread;

    fn batch_of(bytes: usize) -> ResultBatch {
        ResultBatch::new(vec![EncodedRow::new(vec![b'x'; bytes])])
    }

    #[test]
    fn test_fifo_and_sequence_stamping() {
        let channel = BufferControlBlock::new(1024, 16);
        for _ in 0..3 {
            channel.put(batch_of(4)).unwrap();
        }
        for expected in 0..3u64 {
            match channel.get(Duration::from_millis(10)).unwrap() {
                Fetch::Batch(batch) => assert_eq!(batch.sequence(), expected),
                other => panic!("expected batch, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_byte_cap_blocks_second_put() {
        // Scenario from the delivery contract: cap 100, two 60-byte batches
        let channel = Arc::new(BufferControlBlock::new(100, 16));
        channel.put(batch_of(60)).unwrap();

        let producer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.put(batch_of(60)))
        };

        // The second put must not land while the first batch is buffered
        thread::sleep(Duration::from_millis(50));
        assert_eq!(channel.len(), 1);

        match channel.get(Duration::from_millis(100)).unwrap() {
            Fetch::Batch(batch) => assert_eq!(batch.sequence(), 0),
            other => panic!("expected batch, got {:?}", other),
        }
        producer.join().unwrap().unwrap();
        assert_eq!(channel.len(), 1);
        assert!(channel.buffered_bytes() <= 100);
    }

    #[test]
    fn test_batch_count_cap() {
        let channel = Arc::new(BufferControlBlock::new(usize::MAX, 2));
        channel.put(batch_of(1)).unwrap();
        channel.put(batch_of(1)).unwrap();

        let producer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.put(batch_of(1)))
        };
        thread::sleep(Duration::from_millis(50));
        assert_eq!(channel.len(), 2);

        assert!(matches!(
            channel.get(Duration::from_millis(100)).unwrap(),
            Fetch::Batch(_)
        ));
        producer.join().unwrap().unwrap();
        assert_eq!(channel.len(), 2);
    }

    #[test]
    fn test_oversize_batch_admitted_when_empty() {
        let channel = BufferControlBlock::new(10, 4);
        channel.put(batch_of(500)).unwrap();
        assert!(matches!(
            channel.get(Duration::from_millis(10)).unwrap(),
            Fetch::Batch(_)
        ));
    }

    #[test]
    fn test_cancel_unblocks_producer() {
        let channel = Arc::new(BufferControlBlock::new(100, 16));
        channel.put(batch_of(60)).unwrap();

        let producer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.put(batch_of(60)))
        };
        thread::sleep(Duration::from_millis(50));
        channel.cancel();

        assert_eq!(producer.join().unwrap(), Err(SinkError::Cancelled));
        // Buffered batches are discarded on cancel
        assert_eq!(channel.len(), 0);
        assert_eq!(channel.buffered_bytes(), 0);
    }

    #[test]
    fn test_cancel_unblocks_consumer() {
        let channel = Arc::new(BufferControlBlock::new(100, 16));
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.get(Duration::from_secs(30)))
        };
        thread::sleep(Duration::from_millis(50));

        let start = Instant::now();
        channel.cancel();
        let result = consumer.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(result, Err(SinkError::Cancelled));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let channel = BufferControlBlock::new(100, 16);
        channel.cancel();
        channel.cancel();
        assert_eq!(
            channel.get(Duration::from_millis(1)),
            Err(SinkError::Cancelled)
        );
    }

    #[test]
    fn test_eos_exactly_once_then_closed() {
        let channel = BufferControlBlock::new(100, 16);
        channel.close_producer();
        channel.close_producer();

        assert_eq!(channel.get(Duration::from_millis(1)).unwrap(), Fetch::Eos);
        assert!(matches!(
            channel.get(Duration::from_millis(1)),
            Err(SinkError::ChannelClosed(_))
        ));
    }

    #[test]
    fn test_draining_delivers_pending_before_eos() {
        let channel = BufferControlBlock::new(1024, 16);
        channel.put(batch_of(4)).unwrap();
        channel.put(batch_of(4)).unwrap();
        channel.close_producer();

        match channel.get(Duration::from_millis(10)).unwrap() {
            Fetch::Batch(batch) => assert!(!batch.is_eos()),
            other => panic!("expected batch, got {:?}", other),
        }
        // Last pending batch carries the advisory eos flag
        match channel.get(Duration::from_millis(10)).unwrap() {
            Fetch::Batch(batch) => assert!(batch.is_eos()),
            other => panic!("expected batch, got {:?}", other),
        }
        assert_eq!(channel.get(Duration::from_millis(10)).unwrap(), Fetch::Eos);
    }

    #[test]
    fn test_put_after_close_fails() {
        let channel = BufferControlBlock::new(1024, 16);
        channel.close_producer();
        assert!(matches!(
            channel.put(batch_of(1)),
            Err(SinkError::ChannelClosed(_))
        ));
    }

    #[test]
    fn test_abort_propagates_to_consumer() {
        let channel = BufferControlBlock::new(1024, 16);
        channel.put(batch_of(4)).unwrap();
        channel.abort(SinkError::Encoding("bad cell".to_string()));

        assert_eq!(
            channel.get(Duration::from_millis(1)),
            Err(SinkError::Encoding("bad cell".to_string()))
        );
        // First terminal transition wins
        channel.cancel();
        assert_eq!(
            channel.put(batch_of(1)),
            Err(SinkError::Encoding("bad cell".to_string()))
        );
    }

    #[test]
    fn test_get_timeout_is_a_signal() {
        let channel = BufferControlBlock::new(1024, 16);
        assert_eq!(
            channel.get(Duration::from_millis(5)).unwrap(),
            Fetch::TimedOut
        );
        // Stream is still live after a timeout
        channel.put(batch_of(1)).unwrap();
        assert!(matches!(
            channel.get(Duration::from_millis(5)).unwrap(),
            Fetch::Batch(_)
        ));
    }

    #[test]
    fn test_concurrent_producers_fifo_per_thread() {
        let channel = Arc::new(BufferControlBlock::new(usize::MAX, usize::MAX));
        let mut handles = Vec::new();
        for t in 0..4u8 {
            let channel = Arc::clone(&channel);
            handles.push(thread::spawn(move || {
                for i in 0..50u8 {
                    let row = EncodedRow::new(vec![t, i]);
                    channel.put(ResultBatch::new(vec![row])).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        channel.close_producer();

        let mut last_seen = [None::<u8>; 4];
        let mut last_sequence = None::<u64>;
        loop {
            match channel.get(Duration::from_millis(10)).unwrap() {
                Fetch::Batch(batch) => {
                    // Delivered sequence numbers are strictly increasing, no gaps
                    if let Some(prev) = last_sequence {
                        assert_eq!(batch.sequence(), prev + 1);
                    }
                    last_sequence = Some(batch.sequence());
                    let bytes = batch.rows()[0].as_bytes().to_vec();
                    let (t, i) = (bytes[0] as usize, bytes[1]);
                    if let Some(prev) = last_seen[t] {
                        assert!(i > prev, "per-producer order violated");
                    }
                    last_seen[t] = Some(i);
                }
                Fetch::Eos => break,
                Fetch::TimedOut => panic!("unexpected timeout"),
            }
        }
        assert_eq!(last_sequence, Some(199));
    }
}
