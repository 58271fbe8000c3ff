//! Lock-free single-producer single-consumer (SPSC) sample ring.
//!
//! Holds interleaved 16-bit samples between the audio update task (which
//! enqueues whole frame groups) and a slower storage task (which dequeues
//! arbitrary sample counts, usually one storage block at a time).
//!
//! # Cursors
//!
//! `head` and `tail` count samples modulo `2 * capacity`. The physical index
//! is the cursor modulo `capacity`, and `head - tail` (in that arithmetic)
//! is the pending sample count. Because the cursors range over twice the
//! buffer, `head == tail` always means empty and a distance of `capacity`
//! means full, so every slot is usable.
//!
//! # Safety Contract
//!
//! - Only ONE context may call [`push_group()`](FrameRing::push_group)
//!   (the "producer").
//! - Only ONE context may call [`consume()`](FrameRing::consume) or
//!   [`discard_pending()`](FrameRing::discard_pending) (the "consumer").
//! - These may be different threads/ISR contexts running concurrently.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// A group of `BLOCK` frames, each holding one sample per channel.
pub type FrameGroup<const CH: usize, const BLOCK: usize> = [[i16; CH]; BLOCK];

/// Fixed-capacity SPSC ring of `GROUPS` frame groups.
///
/// Capacity is `CH * BLOCK * GROUPS` samples. The producer always writes a
/// whole group at a group-aligned position, so a group never straddles the
/// physical end of the buffer; the consumer may read any span and sees it as
/// one or two slices.
pub struct FrameRing<const CH: usize, const BLOCK: usize, const GROUPS: usize> {
    buffer: UnsafeCell<[FrameGroup<CH, BLOCK>; GROUPS]>,
    /// Write cursor (only modified by the producer).
    head: AtomicUsize,
    /// Read cursor (only modified by the consumer).
    tail: AtomicUsize,
}

// SAFETY: The SPSC contract ensures that head and tail are only modified by
// their respective sides. The producer only writes the region between head
// and tail + capacity, the consumer only reads between tail and head, and
// acquire/release ordering on the cursors makes those regions disjoint in time.
unsafe impl<const CH: usize, const BLOCK: usize, const GROUPS: usize> Sync
    for FrameRing<CH, BLOCK, GROUPS>
{
}

impl<const CH: usize, const BLOCK: usize, const GROUPS: usize> FrameRing<CH, BLOCK, GROUPS> {
    /// Samples in one frame group.
    pub const GROUP_SAMPLES: usize = CH * BLOCK;

    /// Total capacity in samples.
    pub const CAPACITY: usize = CH * BLOCK * GROUPS;

    /// Create a new empty ring.
    ///
    /// # Panics
    ///
    /// Compile-time assertion: `CH`, `BLOCK` and `GROUPS` must all be non-zero.
    pub const fn new() -> Self {
        assert!(CH > 0 && BLOCK > 0 && GROUPS > 0, "ring dimensions must be non-zero");

        FrameRing {
            buffer: UnsafeCell::new([[[0; CH]; BLOCK]; GROUPS]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Total capacity in samples.
    pub const fn capacity(&self) -> usize {
        Self::CAPACITY
    }

    #[inline]
    const fn advance(cursor: usize, count: usize) -> usize {
        (cursor + count) % (2 * Self::CAPACITY)
    }

    #[inline]
    const fn distance(head: usize, tail: usize) -> usize {
        (head + 2 * Self::CAPACITY - tail) % (2 * Self::CAPACITY)
    }

    /// Number of samples enqueued but not yet consumed.
    pub fn pending(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        Self::distance(head, tail)
    }

    /// Check if the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Check if another frame group would not fit.
    pub fn is_full(&self) -> bool {
        self.pending() + Self::GROUP_SAMPLES > Self::CAPACITY
    }

    fn samples_ptr(&self) -> *mut i16 {
        self.buffer.get().cast::<i16>()
    }

    /// Enqueue one frame group (producer side).
    ///
    /// `fill` is handed the group slot at `head` and must write every frame.
    /// Returns `false` without calling `fill` when the group does not fit.
    pub fn push_group<F>(&self, fill: F) -> bool
    where
        F: FnOnce(&mut FrameGroup<CH, BLOCK>),
    {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if Self::distance(head, tail) + Self::GROUP_SAMPLES > Self::CAPACITY {
            return false;
        }

        let start = head % Self::CAPACITY;
        debug_assert_eq!(start % Self::GROUP_SAMPLES, 0);

        // SAFETY: We are the sole producer. The group at `start` lies outside
        // the pending span [tail, head), so the consumer is not reading it,
        // and group alignment keeps it inside the buffer.
        let group = unsafe {
            &mut *self
                .samples_ptr()
                .add(start)
                .cast::<FrameGroup<CH, BLOCK>>()
        };
        fill(group);

        // Release ordering ensures the group is visible before head advances.
        self.head
            .store(Self::advance(head, Self::GROUP_SAMPLES), Ordering::Release);
        true
    }

    /// Dequeue exactly `count` samples (consumer side).
    ///
    /// Returns `Ok(false)` without touching anything if fewer than `count`
    /// samples are pending (or `count` is zero). Otherwise `write` is called
    /// once with a contiguous span, or twice (tail to physical end, then
    /// start to remainder) when the span wraps. `tail` advances by `count`
    /// even if `write` fails: samples of a failed attempt are dropped, and
    /// the first error is returned.
    pub fn consume<E, W>(&self, count: usize, mut write: W) -> Result<bool, E>
    where
        W: FnMut(&[i16]) -> Result<(), E>,
    {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if count == 0 || Self::distance(head, tail) < count {
            return Ok(false);
        }

        let start = tail % Self::CAPACITY;
        let first = count.min(Self::CAPACITY - start);
        let ptr = self.samples_ptr();

        // SAFETY: We are the sole consumer and [tail, tail + count) is
        // pending, so the producer has published it and will not touch it
        // until tail advances. Both spans lie inside the buffer.
        let result = unsafe {
            write(core::slice::from_raw_parts(ptr.add(start), first)).and_then(|()| {
                if first < count {
                    write(core::slice::from_raw_parts(ptr, count - first))
                } else {
                    Ok(())
                }
            })
        };

        // Release ordering ensures the reads complete before tail advances,
        // freeing the span for the producer.
        self.tail.store(Self::advance(tail, count), Ordering::Release);
        result.map(|()| true)
    }

    /// Drop everything pending (consumer side). Returns the samples discarded.
    pub fn discard_pending(&self) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        self.tail.store(head, Ordering::Release);
        Self::distance(head, tail)
    }
}

impl<const CH: usize, const BLOCK: usize, const GROUPS: usize> Default
    for FrameRing<CH, BLOCK, GROUPS>
{
    fn default() -> Self {
        Self::new()
    }
}
