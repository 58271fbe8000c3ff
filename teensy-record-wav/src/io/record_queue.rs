//! Graph-to-storage interleaving record queue.
//!
//! [`RecordQueue`] is the shared half of a recording: the audio update task
//! hands it one block per channel every tick, and the storage task drains
//! interleaved samples from it at its own pace. Both sides take `&self`, so
//! the queue can live in a `static` and be touched from an ISR and from idle
//! code at the same time.
//!
//! ## Usage
//!
//! ```ignore
//! static QUEUE: RecordQueueStereo<DEFAULT_QUEUE_BLOCKS> = RecordQueue::new();
//!
//! // In the audio update task (every 128 samples):
//! QUEUE.update([left_block, right_block]);
//!
//! // In the storage task:
//! QUEUE.drain(FILE_BLOCK_SAMPLES, |samples| sd_write(samples))?;
//! ```
//!
//! When the queue cannot take another frame group the incoming blocks are
//! dropped and counted; the producer never waits.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::constants::AUDIO_BLOCK_SAMPLES;

use super::interleave::interleave;
use super::ring::FrameRing;

/// Single-channel queue of 128-sample blocks.
pub type RecordQueueMono<const GROUPS: usize> = RecordQueue<1, AUDIO_BLOCK_SAMPLES, GROUPS>;

/// Two-channel queue of 128-sample blocks.
pub type RecordQueueStereo<const GROUPS: usize> = RecordQueue<2, AUDIO_BLOCK_SAMPLES, GROUPS>;

/// Snapshot of the producer-side counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockCounters {
    /// Ticks on which every channel delivered a block.
    pub valid: u32,
    /// Complete ticks dropped because the queue was full.
    pub dropped: u32,
    /// Ticks on which some, but not all, channels delivered a block.
    pub partial: u32,
    /// Highest pending sample count seen by the producer.
    pub max_pending: u32,
}

/// Interleaving SPSC queue between the audio update task and storage.
///
/// Holds `GROUPS` frame groups of `CH` channels × `BLOCK` samples.
pub struct RecordQueue<const CH: usize, const BLOCK: usize, const GROUPS: usize> {
    ring: FrameRing<CH, BLOCK, GROUPS>,
    enabled: AtomicBool,
    valid: AtomicU32,
    dropped: AtomicU32,
    partial: AtomicU32,
    max_pending: AtomicU32,
}

impl<const CH: usize, const BLOCK: usize, const GROUPS: usize> RecordQueue<CH, BLOCK, GROUPS> {
    /// Samples enqueued per complete tick.
    pub const GROUP_SAMPLES: usize = CH * BLOCK;

    /// Queue capacity in samples.
    pub const CAPACITY: usize = CH * BLOCK * GROUPS;

    /// Create a new, disabled, empty queue.
    pub const fn new() -> Self {
        RecordQueue {
            ring: FrameRing::new(),
            enabled: AtomicBool::new(false),
            valid: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            partial: AtomicU32::new(0),
            max_pending: AtomicU32::new(0),
        }
    }

    /// Producer step: accept one tick worth of channel blocks.
    ///
    /// `inputs[c]` is the block delivered for channel `c`, or `None` if that
    /// channel produced nothing this tick. A block that does not hold exactly
    /// `BLOCK` samples is treated as missing. The tick is enqueued only when
    /// every channel delivered; otherwise nothing is enqueued. All blocks are
    /// dropped (released back to their owner) before returning, whatever the
    /// outcome.
    pub fn update<B: AsRef<[i16]>>(&self, inputs: [Option<B>; CH]) {
        if !self.enabled.load(Ordering::Acquire) {
            return;
        }

        let mut blocks: [&[i16]; CH] = [&[]; CH];
        let mut received = 0;
        for (slot, input) in blocks.iter_mut().zip(&inputs) {
            if let Some(block) = input {
                let samples = block.as_ref();
                if samples.len() == BLOCK {
                    *slot = samples;
                    received += 1;
                }
            }
        }

        if received < CH {
            if received != 0 {
                self.partial.fetch_add(1, Ordering::Relaxed);
            }
            return;
        }

        self.valid.fetch_add(1, Ordering::Relaxed);
        self.max_pending
            .fetch_max(saturating_u32(self.ring.pending()), Ordering::Relaxed);

        if !self.ring.push_group(|group| interleave(group, &blocks)) {
            // queue is not draining fast enough
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Consumer step: hand exactly `count` interleaved samples to `write`.
    ///
    /// Returns `Ok(false)` and does nothing if fewer than `count` samples are
    /// pending. See [`FrameRing::consume`] for the one-or-two-slice contract
    /// and what happens when `write` fails.
    pub fn drain<E, W>(&self, count: usize, write: W) -> Result<bool, E>
    where
        W: FnMut(&[i16]) -> Result<(), E>,
    {
        self.ring.consume(count, write)
    }

    /// Number of interleaved samples waiting to be drained.
    pub fn pending(&self) -> usize {
        self.ring.pending()
    }

    /// Queue capacity in samples.
    pub const fn capacity(&self) -> usize {
        Self::CAPACITY
    }

    /// Whether the producer step currently accepts blocks.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Empty the queue, zero the counters and start accepting blocks.
    ///
    /// Consumer side: emptying is done by moving `tail` up to `head`.
    pub fn start(&self) {
        self.ring.discard_pending();
        self.reset_counters();
        self.enabled.store(true, Ordering::Release);
    }

    /// Stop accepting blocks. Samples already queued can still be drained.
    pub fn stop(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Snapshot of the producer counters.
    pub fn counters(&self) -> BlockCounters {
        BlockCounters {
            valid: self.valid.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            partial: self.partial.load(Ordering::Relaxed),
            max_pending: self.max_pending.load(Ordering::Relaxed),
        }
    }

    pub fn valid_block_count(&self) -> u32 {
        self.valid.load(Ordering::Relaxed)
    }

    pub fn dropped_block_count(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn partial_block_count(&self) -> u32 {
        self.partial.load(Ordering::Relaxed)
    }

    pub fn max_pending_sample_count(&self) -> u32 {
        self.max_pending.load(Ordering::Relaxed)
    }

    /// Zero all producer counters.
    pub fn reset_counters(&self) {
        self.valid.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.partial.store(0, Ordering::Relaxed);
        self.max_pending.store(0, Ordering::Relaxed);
    }
}

impl<const CH: usize, const BLOCK: usize, const GROUPS: usize> Default
    for RecordQueue<CH, BLOCK, GROUPS>
{
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
