//! Lock-free pool of reusable output buffers.
//!
//! Encoders take a buffer with [`BufferPool::get`], serialize one document
//! into it and move it to the writer, which hands it back with
//! [`BufferPool::put`] once the bytes are written. The pool never owns a
//! buffer that is checked out.
//!
//! The pool is a cache, not a limit: an empty pool allocates, and returned
//! buffers are always kept unless they grew past the retention cap.

use crossbeam::queue::SegQueue;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Initial capacity of freshly allocated buffers.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4 * 1024;

/// Buffers above this capacity are dropped instead of returned to the pool.
pub const DEFAULT_MAX_RETAINED_CAPACITY: usize = 1024 * 1024;

/// Pool of `Vec<u8>` buffers shared by all encoder workers and the writer.
#[derive(Debug)]
pub struct BufferPool {
    queue: SegQueue<Vec<u8>>,
    buffer_capacity: usize,
    max_retained_capacity: usize,
    metrics: BufferPoolMetrics,
}

/// Counters for buffer pool monitoring.
#[derive(Debug, Default)]
pub struct BufferPoolMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
}

/// Point-in-time copy of [`BufferPoolMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub drops: u64,
}

impl PoolSnapshot {
    /// Fraction of `get` calls served from the pool (1.0 when unused).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl BufferPoolMetrics {
    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_RETAINED_CAPACITY)
    }
}

impl BufferPool {
    /// Create an empty pool.
    ///
    /// * `buffer_capacity` - capacity of buffers allocated on a miss
    /// * `max_retained_capacity` - returned buffers larger than this are dropped
    #[must_use]
    pub fn new(buffer_capacity: usize, max_retained_capacity: usize) -> Self {
        Self {
            queue: SegQueue::new(),
            buffer_capacity,
            max_retained_capacity: max_retained_capacity.max(buffer_capacity),
            metrics: BufferPoolMetrics::default(),
        }
    }

    /// Take an empty buffer, allocating one if the pool is empty.
    #[inline]
    pub fn get(&self) -> Vec<u8> {
        match self.queue.pop() {
            Some(buf) => {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                Vec::with_capacity(self.buffer_capacity)
            }
        }
    }

    /// Clear `buf` and make it available to the next [`get`](Self::get).
    #[inline]
    pub fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > self.max_retained_capacity {
            self.metrics.drops.fetch_add(1, Ordering::Relaxed);
            return;
        }
        buf.clear();
        self.queue.push(buf);
        self.metrics.returns.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of idle buffers currently held.
    #[inline]
    pub fn available(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn metrics(&self) -> &BufferPoolMetrics {
        &self.metrics
    }
}
