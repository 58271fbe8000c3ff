/// Number of 16-bit samples per audio block delivered by the audio graph.
pub const AUDIO_BLOCK_SAMPLES: usize = 128;

/// Exact audio sample rate in Hz (matches Teensy hardware PLL configuration).
pub const AUDIO_SAMPLE_RATE_EXACT: f32 = 44_117.647;

/// Sample rate written to the WAV header, in whole Hz.
pub const AUDIO_RECORD_SAMPLE_RATE: u32 = 44_117;

/// Bytes per storage block (one SD card sector).
pub const FILE_BLOCK_BYTES: usize = 512;

/// 16-bit samples per storage block. This is the default drain size.
pub const FILE_BLOCK_SAMPLES: usize = FILE_BLOCK_BYTES / core::mem::size_of::<i16>();

/// Default amount of audio the record queue can hold, in milliseconds.
///
/// Should be large enough to ride out long SD card writes.
pub const DEFAULT_QUEUE_MILLIS: u32 = 1000;

/// Number of frame groups needed to buffer `millis` of audio at
/// `sample_rate`, with `block` samples per channel block. Rounds up.
pub const fn queue_block_count(millis: u32, sample_rate: u32, block: usize) -> usize {
    let samples = millis as u64 * sample_rate as u64;
    let per_block = 1000 * block as u64;
    let count = (samples + per_block - 1) / per_block;
    if count == 0 {
        1
    } else {
        count as usize
    }
}

/// Frame groups in a default-sized queue (1000 ms of 128-sample blocks).
pub const DEFAULT_QUEUE_BLOCKS: usize =
    queue_block_count(DEFAULT_QUEUE_MILLIS, AUDIO_RECORD_SAMPLE_RATE, AUDIO_BLOCK_SAMPLES);
