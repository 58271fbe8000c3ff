//! WAV recorder: the storage side of a [`RecordQueue`].
//!
//! [`WavRecorder`] owns the output stream and drives a recording's lifecycle:
//!
//! 1. [`begin()`](WavRecorder::begin) / [`begin_with()`](WavRecorder::begin_with)
//!    write the WAV header, empty the queue and enable the producer.
//! 2. [`process()`](WavRecorder::process) is called from the main loop (or a
//!    low-priority task) and writes one storage block whenever one is
//!    pending.
//! 3. [`end()`](WavRecorder::end) disables the producer, flushes whatever is
//!    still queued and patches the header.
//!
//! The audio update task only ever sees the queue, never the stream.
//!
//! ```ignore
//! static QUEUE: RecordQueueStereo<DEFAULT_QUEUE_BLOCKS> = RecordQueue::new();
//!
//! let mut recorder = WavRecorder::new(&QUEUE, RecorderConfig::default());
//! recorder.begin(&mut sd, "RECORD.WAV")?;
//!
//! loop {
//!     recorder.process()?;
//!     if button_pressed() {
//!         recorder.end()?;
//!     }
//! }
//! ```

use tracing::{debug, info, trace, warn};

use crate::clock::{elapsed_micros, Clock};
use crate::config::RecorderConfig;
use crate::error::{RecordError, Result};
use crate::stats::{Stats, StatsAccumulator};
use crate::storage::{Storage, Volume};
use crate::wav::{WavFormat, WavSummary, WavWriter};

use super::record_queue::{BlockCounters, RecordQueue};

/// Records the samples of a [`RecordQueue`] into a WAV file.
pub struct WavRecorder<'a, S, const CH: usize, const BLOCK: usize, const GROUPS: usize>
where
    S: Storage,
{
    queue: &'a RecordQueue<CH, BLOCK, GROUPS>,
    config: RecorderConfig,
    writer: Option<WavWriter<S>>,
    clock: Option<&'a dyn Clock>,
    write_latency: StatsAccumulator,
}

impl<'a, S, const CH: usize, const BLOCK: usize, const GROUPS: usize>
    WavRecorder<'a, S, CH, BLOCK, GROUPS>
where
    S: Storage,
{
    /// Create an idle recorder for `queue`.
    ///
    /// `config.file_block_samples` is capped at the queue capacity; a larger
    /// drain could never be satisfied.
    pub fn new(queue: &'a RecordQueue<CH, BLOCK, GROUPS>, mut config: RecorderConfig) -> Self {
        let capacity = RecordQueue::<CH, BLOCK, GROUPS>::CAPACITY;
        if config.file_block_samples > capacity {
            debug!(
                requested = config.file_block_samples,
                capacity, "drain size capped at queue capacity"
            );
            config.file_block_samples = capacity;
        }

        WavRecorder {
            queue,
            config,
            writer: None,
            clock: None,
            write_latency: StatsAccumulator::new(),
        }
    }

    /// Time every storage write with `clock`; see [`write_stats()`](Self::write_stats).
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn is_recording(&self) -> bool {
        self.writer.is_some()
    }

    /// Start recording to `name` on `volume`, replacing any existing file.
    ///
    /// Nothing is enabled if the file cannot be created or the header
    /// cannot be written.
    pub fn begin<V>(&mut self, volume: &mut V, name: &str) -> Result<(), S::Error>
    where
        V: Volume<File = S>,
    {
        if self.is_recording() {
            return Err(RecordError::AlreadyRecording);
        }

        if volume.exists(name) {
            debug!(name, "removing existing file");
            volume.remove(name).map_err(RecordError::Storage)?;
        }
        let file = volume.create(name).map_err(RecordError::Storage)?;
        self.begin_with(file)
    }

    /// Start recording to an already-open stream, at its current position.
    pub fn begin_with(&mut self, stream: S) -> Result<(), S::Error> {
        if self.is_recording() {
            return Err(RecordError::AlreadyRecording);
        }

        let format = WavFormat::new(CH as u16, self.config.sample_rate);
        self.writer = Some(WavWriter::create(stream, format)?);
        self.queue.start();

        debug!(
            channels = CH,
            sample_rate = self.config.sample_rate,
            capacity = self.queue.capacity(),
            "recording started"
        );
        Ok(())
    }

    /// Consumer step: write one storage block if that much is pending.
    ///
    /// Returns `Ok(true)` if a block was written, `Ok(false)` if there was
    /// not enough data yet or no recording is in progress.
    pub fn process(&mut self) -> Result<bool, S::Error> {
        let count = self.config.file_block_samples;
        self.write_pending(count)
    }

    /// Stop recording: drain the queue, patch the header, close the stream.
    ///
    /// Finalization runs even if draining fails; the first error is returned.
    pub fn end(&mut self) -> Result<WavSummary, S::Error> {
        if !self.is_recording() {
            return Err(RecordError::NotRecording);
        }
        self.queue.stop();

        // producer is off, so pending only shrinks
        let block = self.config.file_block_samples;
        let mut drained = Ok(());
        while self.queue.pending() > block {
            if let Err(e) = self.write_pending(block) {
                drained = Err(e);
                break;
            }
        }
        if drained.is_ok() {
            let rest = self.queue.pending();
            drained = self.write_pending(rest).map(|_| ());
        }

        let counters = self.queue.counters();
        if counters.dropped > 0 {
            warn!(
                dropped = counters.dropped,
                max_pending = counters.max_pending,
                "blocks were dropped during recording"
            );
        }

        let writer = self.writer.take().ok_or(RecordError::NotRecording)?;
        let finalized = writer.finalize();
        if let Ok(summary) = &finalized {
            info!(
                data_bytes = summary.data_bytes,
                valid = counters.valid,
                partial = counters.partial,
                "recording finished"
            );
        }

        drained.and(finalized)
    }

    fn write_pending(&mut self, count: usize) -> Result<bool, S::Error> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(false);
        };

        let started = self.clock.map(|c| c.now_micros());
        let mut segments = 0;
        let written = self.queue.drain(count, |samples| {
            segments += 1;
            writer.write_samples(samples)
        });

        match written {
            Ok(true) => {
                if segments > 1 {
                    trace!(count, "chunk wrapped, written in two parts");
                }
                if let (Some(clock), Some(started)) = (self.clock, started) {
                    let micros = elapsed_micros(started, clock.now_micros());
                    self.write_latency.add(micros as f32);
                }
            }
            Ok(false) => {}
            Err(ref e) => warn!(count, error = ?e, "storage write failed, samples lost"),
        }
        written
    }

    /// Snapshot of the queue's block counters for the current recording.
    pub fn counters(&self) -> BlockCounters {
        self.queue.counters()
    }

    /// Write-latency statistics in microseconds (empty without a clock).
    ///
    /// Unlike the block counters these survive [`begin()`](Self::begin).
    pub fn write_stats(&self) -> &Stats {
        self.write_latency.get()
    }

    /// Zero the block counters and forget all latency observations.
    pub fn reset_statistics(&mut self) {
        self.queue.reset_counters();
        self.write_latency.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{le_u32, ScriptedStorage, ScriptedVolume};
    use core::cell::Cell;
    use std::string::ToString;

    struct StepClock {
        now: Cell<u32>,
        step: u32,
    }

    impl Clock for StepClock {
        fn now_micros(&self) -> u32 {
            let t = self.now.get();
            self.now.set(t.wrapping_add(self.step));
            t
        }
    }

    fn mono_ramp(start: i16) -> [i16; 4] {
        [start, start + 1, start + 2, start + 3]
    }

    #[test]
    fn process_is_noop_when_idle() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut rec: WavRecorder<'_, ScriptedStorage, 1, 4, 4> =
            WavRecorder::new(&q, RecorderConfig::new().file_block_samples(4));
        assert!(!rec.process().unwrap());
        assert!(!rec.is_recording());
    }

    #[test]
    fn drain_size_is_capped_at_queue_capacity() {
        let q: RecordQueue<1, 4, 2> = RecordQueue::new();
        let mut rec = WavRecorder::new(&q, RecorderConfig::new().file_block_samples(16));
        assert_eq!(rec.config().file_block_samples, 8);
        rec.begin_with(ScriptedStorage::default()).unwrap();

        for tick in 0..20 {
            q.update([Some(mono_ramp(tick))]);
            while rec.process().unwrap() {}
        }
        assert_eq!(q.pending(), 0);
        assert_eq!(rec.counters().valid, 20);
        assert_eq!(rec.counters().dropped, 0);

        let summary = rec.end().unwrap();
        assert_eq!(summary.data_bytes, 20 * 4 * 2);
    }

    #[test]
    fn smaller_drain_size_is_kept() {
        let q: RecordQueue<2, 4, 4> = RecordQueue::new();
        let rec: WavRecorder<'_, ScriptedStorage, 2, 4, 4> =
            WavRecorder::new(&q, RecorderConfig::new().file_block_samples(6));
        assert_eq!(rec.config().file_block_samples, 6);
    }

    #[test]
    fn end_without_begin_is_rejected() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut rec: WavRecorder<'_, ScriptedStorage, 1, 4, 4> =
            WavRecorder::new(&q, RecorderConfig::default());
        assert!(matches!(rec.end(), Err(RecordError::NotRecording)));
    }

    #[test]
    fn begin_twice_is_rejected_without_side_effects() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut volume = ScriptedVolume::default();
        let mut rec = WavRecorder::new(&q, RecorderConfig::new().file_block_samples(4));
        rec.begin(&mut volume, "A.WAV").unwrap();
        q.update([Some(mono_ramp(1))]);

        assert!(matches!(
            rec.begin(&mut volume, "B.WAV"),
            Err(RecordError::AlreadyRecording)
        ));
        assert_eq!(volume.files.len(), 1);
        assert_eq!(q.pending(), 4);
        assert_eq!(q.valid_block_count(), 1);
    }

    #[test]
    fn begin_replaces_existing_file() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut volume = ScriptedVolume {
            existing: std::vec!["REC.WAV".to_string()],
            ..Default::default()
        };
        let mut rec = WavRecorder::new(&q, RecorderConfig::default());

        rec.begin(&mut volume, "REC.WAV").unwrap();

        assert_eq!(volume.removed, ["REC.WAV"]);
        assert_eq!(volume.files.len(), 1);
        assert!(q.is_enabled());
    }

    #[test]
    fn failed_open_enables_nothing() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut volume = ScriptedVolume {
            fail_create: true,
            ..Default::default()
        };
        let mut rec = WavRecorder::new(&q, RecorderConfig::default());

        assert!(matches!(
            rec.begin(&mut volume, "REC.WAV"),
            Err(RecordError::Storage("no card"))
        ));
        assert!(!rec.is_recording());
        assert!(!q.is_enabled());
    }

    #[test]
    fn failed_header_enables_nothing() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut rec = WavRecorder::new(&q, RecorderConfig::default());
        let storage = ScriptedStorage {
            fail_write_at: Some(0),
            ..Default::default()
        };

        assert!(rec.begin_with(storage).is_err());
        assert!(!rec.is_recording());
        assert!(!q.is_enabled());
    }

    #[test]
    fn process_writes_whole_blocks_only() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut volume = ScriptedVolume::default();
        let mut rec = WavRecorder::new(&q, RecorderConfig::new().file_block_samples(8));
        rec.begin(&mut volume, "R.WAV").unwrap();

        q.update([Some(mono_ramp(0))]);
        assert!(!rec.process().unwrap());
        q.update([Some(mono_ramp(4))]);
        assert!(rec.process().unwrap());
        assert_eq!(q.pending(), 0);

        let file = volume.last_file();
        assert_eq!(file.borrow().writes, [44, 16]);
        assert_eq!(file.borrow().payload_samples(), [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn end_drains_remainder_and_patches_header() {
        let q: RecordQueue<2, 4, 4> = RecordQueue::new();
        let mut volume = ScriptedVolume::default();
        let mut rec = WavRecorder::new(&q, RecorderConfig::new().file_block_samples(16));
        rec.begin(&mut volume, "R.WAV").unwrap();

        for t in 0..3 {
            q.update([Some(mono_ramp(t * 10)), Some(mono_ramp(-t * 10))]);
        }
        // 24 pending: one full block of 16 then a remainder of 8
        let summary = rec.end().unwrap();
        assert_eq!(summary.data_bytes, 48);
        assert_eq!(summary.file_bytes, 92);
        assert!(!q.is_enabled());

        let file = volume.last_file();
        let file = file.borrow();
        assert_eq!(file.writes, [44, 32, 16, 4, 4]);
        assert_eq!(le_u32(&file.data, 4), file.data.len() as u32 - 8);
        assert_eq!(le_u32(&file.data, 40), 48);
        assert!(file.flushed);
        assert!(file.closed);
    }

    #[test]
    fn producer_ignored_after_end() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut rec = WavRecorder::new(&q, RecorderConfig::default());
        rec.begin_with(ScriptedStorage::default()).unwrap();
        rec.end().unwrap();

        q.update([Some(mono_ramp(0))]);
        assert_eq!(q.pending(), 0);
        assert!(matches!(rec.end(), Err(RecordError::NotRecording)));
    }

    #[test]
    fn write_error_is_reported_and_samples_are_lost() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut volume = ScriptedVolume::default();
        let mut rec = WavRecorder::new(&q, RecorderConfig::new().file_block_samples(4));
        rec.begin(&mut volume, "R.WAV").unwrap();
        volume.last_file().borrow_mut().fail_write_at = Some(1);

        q.update([Some(mono_ramp(0))]);
        q.update([Some(mono_ramp(4))]);

        assert!(matches!(
            rec.process(),
            Err(RecordError::Storage("write failed"))
        ));
        assert_eq!(q.pending(), 4);
        assert!(rec.process().unwrap());
        assert_eq!(volume.last_file().borrow().payload_samples(), [4, 5, 6, 7]);
        assert!(rec.is_recording());
    }

    #[test]
    fn end_still_finalizes_after_drain_error() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut volume = ScriptedVolume::default();
        let mut rec = WavRecorder::new(&q, RecorderConfig::new().file_block_samples(4));
        rec.begin(&mut volume, "R.WAV").unwrap();
        volume.last_file().borrow_mut().fail_write_at = Some(1);

        q.update([Some(mono_ramp(0))]);
        q.update([Some(mono_ramp(4))]);

        assert!(matches!(rec.end(), Err(RecordError::Storage(_))));
        assert!(!rec.is_recording());

        let file = volume.last_file();
        let file = file.borrow();
        assert!(file.closed);
        assert_eq!(le_u32(&file.data, 40), 0);
    }

    #[test]
    fn finalize_error_is_reported() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut volume = ScriptedVolume::default();
        let mut rec = WavRecorder::new(&q, RecorderConfig::default());
        rec.begin(&mut volume, "R.WAV").unwrap();
        volume.last_file().borrow_mut().fail_seek = true;

        assert!(matches!(rec.end(), Err(RecordError::Storage("seek failed"))));
        assert!(!rec.is_recording());
    }

    #[test]
    fn latency_is_recorded_with_clock() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let clock = StepClock {
            now: Cell::new(u32::MAX - 10),
            step: 25,
        };
        let mut rec = WavRecorder::new(&q, RecorderConfig::new().file_block_samples(4))
            .with_clock(&clock);
        rec.begin_with(ScriptedStorage::default()).unwrap();

        for _ in 0..3 {
            q.update([Some(mono_ramp(0))]);
            assert!(rec.process().unwrap());
        }
        // declined drains are not timed
        assert!(!rec.process().unwrap());

        let stats = *rec.write_stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 25.0);
        assert_eq!(stats.min, 25.0);
        assert_eq!(stats.max, 25.0);
    }

    #[test]
    fn latency_survives_restart_until_reset() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let clock = StepClock {
            now: Cell::new(0),
            step: 3,
        };
        let mut rec = WavRecorder::new(&q, RecorderConfig::new().file_block_samples(4))
            .with_clock(&clock);

        rec.begin_with(ScriptedStorage::default()).unwrap();
        q.update([Some(mono_ramp(0))]);
        rec.process().unwrap();
        rec.end().unwrap();

        rec.begin_with(ScriptedStorage::default()).unwrap();
        assert_eq!(rec.write_stats().count, 1);
        assert_eq!(rec.counters(), BlockCounters::default());

        q.update([Some(mono_ramp(0))]);
        rec.reset_statistics();
        assert_eq!(rec.write_stats().count, 0);
        assert_eq!(rec.counters().valid, 0);
    }

    #[test]
    fn no_clock_no_stats() {
        let q: RecordQueue<1, 4, 4> = RecordQueue::new();
        let mut rec = WavRecorder::new(&q, RecorderConfig::new().file_block_samples(4));
        rec.begin_with(ScriptedStorage::default()).unwrap();
        q.update([Some(mono_ramp(0))]);
        assert!(rec.process().unwrap());
        assert_eq!(rec.write_stats().count, 0);
    }
}
