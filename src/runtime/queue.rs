//! Bounded ring-buffer queue for per-agent signal inboxes.
//!
//! Capacity is always rounded to a power of two so wrap-around is a
//! bitmask rather than a modulo. A single-threaded scheduler only ever
//! touches one queue at a time, so a plain `Vec` behind `&mut self`
//! already gives all the throughput this needs — no lock-free design.

use crate::domain::QueueCapacity;
use crate::runtime::signal::Signal;

/// Point-in-time queue counters. `total_enqueued - total_dequeued -
/// dropped_count` always equals the queue's current `len()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Total signals ever accepted by `enqueue`.
    pub total_enqueued: u64,
    /// Total signals ever removed by `dequeue`.
    pub total_dequeued: u64,
    /// Total signals rejected because the queue was full.
    pub dropped_count: u64,
}

/// A fixed-capacity FIFO of signals, backing one agent's inbox for one
/// frequency subscription.
#[derive(Debug)]
pub struct SignalQueue {
    buffer: Vec<Option<Signal>>,
    mask: u32,
    head: u32,
    len: u32,
    stats: QueueStats,
}

impl SignalQueue {
    /// Creates an empty queue with the given power-of-two capacity.
    #[must_use]
    pub fn new(capacity: QueueCapacity) -> Self {
        let cap = capacity.into_inner();
        Self {
            buffer: (0..cap).map(|_| None).collect(),
            mask: capacity.mask(),
            head: 0,
            len: 0,
            stats: QueueStats::default(),
        }
    }

    /// Total capacity, a power of two.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of signals currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the queue holds no signals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the queue is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len as usize == self.buffer.len()
    }

    /// Lifetime enqueue/dequeue/drop counters. `total_enqueued -
    /// total_dequeued - dropped_count == len()` at all times.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Appends a signal to the tail.
    ///
    /// # Errors
    ///
    /// Returns the signal back to the caller, unconsumed, if the queue
    /// is full, and increments `dropped_count` — the caller (the
    /// network's emission router) turns this into a `RuntimeEvent::DeliveryDropped`
    /// and a `CycleReport.dropped_deliveries` tally.
    pub fn enqueue(&mut self, signal: Signal) -> Result<(), Signal> {
        self.stats.total_enqueued += 1;
        if self.is_full() {
            self.stats.dropped_count += 1;
            return Err(signal);
        }
        let tail = (self.head + self.len) & self.mask;
        self.buffer[tail as usize] = Some(signal);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the signal at the head, if any.
    pub fn dequeue(&mut self) -> Option<Signal> {
        if self.is_empty() {
            return None;
        }
        let slot = self.head as usize;
        let signal = self.buffer[slot].take();
        self.head = (self.head + 1) & self.mask;
        self.len -= 1;
        self.stats.total_dequeued += 1;
        signal
    }
}
