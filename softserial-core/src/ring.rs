//! Fixed-capacity byte ring buffer shared between interrupt and thread context.
//!
//! Each buffer has exactly one producer and one consumer. The producer owns the
//! `head` cursor, the consumer owns `tail`; both advance monotonically and are
//! reduced modulo the capacity only when indexing storage, so a full buffer
//! holds all `N` bytes.
//!
//! Operations that move both cursors ([`RingBuffer::clear`],
//! [`RingBuffer::reset`]) require a [`CriticalSection`] token: they must run
//! with the other side's interrupt source masked.

use core::cell::UnsafeCell;
use critical_section::CriticalSection;
use portable_atomic::{AtomicU32, AtomicUsize, Ordering};

/// Ring buffer size used for each direction of a soft serial port.
pub const SOFTSERIAL_BUFFER_SIZE: usize = 256;

/// Single-producer/single-consumer byte FIFO with drop-and-count overflow.
pub struct RingBuffer<const N: usize> {
    storage: UnsafeCell<[u8; N]>,
    /// Write cursor, only advanced by the producer.
    head: AtomicUsize,
    /// Read cursor, only advanced by the consumer.
    tail: AtomicUsize,
    /// Bytes dropped because the buffer was full.
    overflows: AtomicU32,
}

// SAFETY: a slot is written by the producer strictly before `head` is published
// (Release) and read by the consumer strictly after observing it (Acquire), and
// the same holds for `tail` in the other direction, so no slot is ever accessed
// from both sides at once.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    const MASK: usize = {
        assert!(N >= 2 && N.is_power_of_two(), "ring buffer capacity must be a power of two");
        N - 1
    };

    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            storage: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overflows: AtomicU32::new(0),
        }
    }

    /// Total number of bytes the buffer can hold.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Append a byte (producer side).
    ///
    /// Returns `false` and bumps the overflow counter if the buffer is full;
    /// queued bytes are never overwritten.
    pub fn push(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if head.wrapping_sub(tail) >= N {
            self.overflows.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: the slot at `head` is outside the consumer's readable range
        // until `head` is published below.
        unsafe {
            self.slot(head).write(byte);
        }
        self.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Remove the oldest byte (consumer side).
    pub fn pop(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        // SAFETY: the slot at `tail` was published by the producer and won't be
        // rewritten until `tail` moves past it.
        let byte = unsafe { self.slot(tail).read() };
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(byte)
    }

    /// Number of bytes queued.
    #[must_use]
    pub fn bytes_waiting(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail).min(N)
    }

    /// Free space in bytes.
    #[inline]
    #[must_use]
    pub fn bytes_free(&self) -> usize {
        N - self.bytes_waiting()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes_waiting() == 0
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.bytes_waiting() == N
    }

    /// Number of bytes dropped on a full buffer since the last [`reset`](Self::reset).
    #[inline]
    #[must_use]
    pub fn overflow_count(&self) -> u32 {
        self.overflows.load(Ordering::Relaxed)
    }

    /// Discard all queued bytes.
    pub fn clear(&self, _cs: CriticalSection<'_>) {
        let head = self.head.load(Ordering::Relaxed);
        self.tail.store(head, Ordering::Release);
    }

    /// Discard all queued bytes and zero the overflow counter.
    pub fn reset(&self, _cs: CriticalSection<'_>) {
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Release);
        self.overflows.store(0, Ordering::Relaxed);
    }

    #[inline]
    fn slot(&self, cursor: usize) -> *mut u8 {
        // SAFETY: `cursor & MASK < N`, so the offset stays inside the array.
        unsafe { self.storage.get().cast::<u8>().add(cursor & Self::MASK) }
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
