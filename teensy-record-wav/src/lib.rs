//! # teensy-record-wav
//!
//! A `no_std`, zero-allocation recorder that streams multi-channel 16-bit
//! audio from a block-based audio graph to a WAV file on block storage
//! (typically an SD card on a Teensy 4.x). The audio update task never
//! blocks: when storage falls behind, whole ticks are dropped and counted.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Queue | [`io`] | Interleaver, lock-free frame ring, record queue, recorder |
//! | Container | [`wav`] | 44-byte PCM header, incremental samples, size patching |
//! | Seams | [`storage`] / [`clock`] | Stream, volume and timer traits |
//! | Telemetry | [`stats`] | Online mean / stdev / min / max |
//! | Setup | [`config`] / [`constants`] | Run-time settings, queue sizing |
//! | Errors | [`error`] | [`RecordError`](error::RecordError) |
//!
//! ## Quick start
//!
//! ```ignore
//! use teensy_record_wav::config::RecorderConfig;
//! use teensy_record_wav::constants::DEFAULT_QUEUE_BLOCKS;
//! use teensy_record_wav::io::{RecordQueue, RecordQueueStereo, WavRecorder};
//!
//! static QUEUE: RecordQueueStereo<DEFAULT_QUEUE_BLOCKS> = RecordQueue::new();
//!
//! // In your audio ISR / timer callback, once per 128-sample tick:
//! QUEUE.update([left, right]);
//!
//! // In the main loop:
//! let mut recorder = WavRecorder::new(&QUEUE, RecorderConfig::default());
//! recorder.begin(&mut sd, "RECORD.WAV")?;
//! loop {
//!     recorder.process()?;
//! }
//! let summary = recorder.end()?;
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `std` | no | `std::io` storage, directory volume, `Instant` clock |
//! | `serde` | no | `Serialize` / `Deserialize` for [`RecorderConfig`](config::RecorderConfig) |
//!
//! ## Audio parameters
//!
//! - **Block size:** 128 samples ([`constants::AUDIO_BLOCK_SAMPLES`])
//! - **Sample rate:** 44 117 Hz in the header ([`constants::AUDIO_RECORD_SAMPLE_RATE`])
//! - **Sample format:** `i16`, little-endian on disk
//! - **Queue:** 1000 ms by default ([`constants::DEFAULT_QUEUE_BLOCKS`])

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod constants;
pub mod error;
pub mod config;
pub mod clock;
pub mod stats;
pub mod storage;
pub mod wav;
pub mod io;

#[cfg(test)]
mod test_support;
