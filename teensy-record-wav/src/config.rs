//! Run-time recorder settings.
//!
//! Queue dimensions are compile-time parameters of
//! [`RecordQueue`](crate::io::RecordQueue); everything that can change
//! between recordings lives here.

use crate::constants::{AUDIO_RECORD_SAMPLE_RATE, FILE_BLOCK_SAMPLES};

/// Settings for a [`WavRecorder`](crate::io::WavRecorder).
///
/// ```
/// use teensy_record_wav::config::RecorderConfig;
///
/// let config = RecorderConfig::new().sample_rate(48_000).file_block_samples(512);
/// assert_eq!(config.sample_rate, 48_000);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RecorderConfig {
    /// Sample rate written to the WAV header, in Hz.
    pub sample_rate: u32,
    /// Samples written per [`process()`](crate::io::WavRecorder::process)
    /// call. One 512-byte storage block by default.
    pub file_block_samples: usize,
}

impl RecorderConfig {
    pub const fn new() -> Self {
        RecorderConfig {
            sample_rate: AUDIO_RECORD_SAMPLE_RATE,
            file_block_samples: FILE_BLOCK_SAMPLES,
        }
    }

    pub const fn sample_rate(mut self, hz: u32) -> Self {
        self.sample_rate = hz;
        self
    }

    /// Set the drain size. Zero is clamped to one sample.
    pub const fn file_block_samples(mut self, samples: usize) -> Self {
        self.file_block_samples = if samples == 0 { 1 } else { samples };
        self
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::new()
    }
}
