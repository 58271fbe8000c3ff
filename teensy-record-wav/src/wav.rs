//! Incremental PCM WAV container writer.
//!
//! Writes the canonical 44-byte header up front with placeholder sizes,
//! appends 16-bit samples as they arrive, and patches the two size fields
//! once the final length is known:
//!
//! ```text
//! offset  size  field
//!      0     4  "RIFF"
//!      4     4  file length - 8          (patched on finalize)
//!      8     4  "WAVE"
//!     12     4  "fmt "
//!     16     4  16 (fmt body length)
//!     20     2  1 (PCM)
//!     22     2  channels
//!     24     4  sample rate
//!     28     4  byte rate = rate * 2 * channels
//!     32     2  block align = 2 * channels
//!     34     2  16 (bits per sample)
//!     36     4  "data"
//!     40     4  payload length           (patched on finalize)
//!     44        samples, little-endian i16, interleaved
//! ```
//!
//! Every integer is serialized with `to_le_bytes`, so output is identical on
//! big- and little-endian hosts.

use tracing::{debug, info};

use crate::constants::FILE_BLOCK_BYTES;
use crate::error::{RecordError, Result};
use crate::storage::Storage;

/// Length of the header written by [`WavWriter::create`].
pub const HEADER_LEN: usize = 44;

const BYTES_PER_SAMPLE: u16 = 2;
const BITS_PER_SAMPLE: u16 = 16;
const PCM_FORMAT_TAG: u16 = 1;
const FMT_BODY_LEN: u32 = 16;

/// Offset of the RIFF size field from the start of the header.
const RIFF_SIZE_OFFSET: u32 = 4;
/// Offset of the data size field from the start of the header.
const DATA_SIZE_OFFSET: u32 = 40;

/// Channel layout and rate of a recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
}

impl WavFormat {
    pub const fn new(channels: u16, sample_rate: u32) -> Self {
        WavFormat {
            channels,
            sample_rate,
        }
    }

    /// Bytes per second of audio.
    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate * BYTES_PER_SAMPLE as u32 * self.channels as u32
    }

    /// Bytes per frame (one sample for every channel).
    pub const fn block_align(&self) -> u16 {
        BYTES_PER_SAMPLE * self.channels
    }
}

/// Sizes of a finalized file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavSummary {
    /// Length of the `data` chunk body.
    pub data_bytes: u32,
    /// Length of the whole file, header included.
    pub file_bytes: u32,
}

/// Build a header describing `data_len` bytes of samples.
///
/// [`WavWriter::create`] writes this with `data_len == 0`. The RIFF size
/// field saturates at `u32::MAX` for payloads within 36 bytes of 4 GiB.
pub fn header_bytes(format: &WavFormat, data_len: u32) -> [u8; HEADER_LEN] {
    let riff_len = data_len.saturating_add(HEADER_LEN as u32 - 8);
    let mut h = [0u8; HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&riff_len.to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");
    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&FMT_BODY_LEN.to_le_bytes());
    h[20..22].copy_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    h[22..24].copy_from_slice(&format.channels.to_le_bytes());
    h[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    h[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
    h[32..34].copy_from_slice(&format.block_align().to_le_bytes());
    h[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_len.to_le_bytes());
    h
}

/// Write all of `bytes`, turning a short count into an error.
fn write_all<S: Storage>(stream: &mut S, bytes: &[u8]) -> Result<(), S::Error> {
    let written = stream.write(bytes).map_err(RecordError::Storage)?;
    if written != bytes.len() {
        return Err(RecordError::ShortWrite {
            requested: bytes.len(),
            written,
        });
    }
    Ok(())
}

/// Streaming WAV writer over a [`Storage`].
///
/// Owns the stream from [`create`](Self::create) until
/// [`finalize`](Self::finalize), which consumes the writer, so the header can
/// only be patched once.
pub struct WavWriter<S: Storage> {
    stream: S,
    /// Stream offset of the RIFF header.
    start: u32,
    data_bytes: u32,
}

impl<S: Storage> WavWriter<S> {
    /// Write a placeholder header at the stream's current position.
    pub fn create(mut stream: S, format: WavFormat) -> Result<Self, S::Error> {
        let start = stream.position().map_err(RecordError::Storage)?;
        write_all(&mut stream, &header_bytes(&format, 0))?;

        debug!(
            channels = format.channels,
            sample_rate = format.sample_rate,
            data_size_pos = start + DATA_SIZE_OFFSET,
            "wav header written"
        );

        Ok(WavWriter {
            stream,
            start,
            data_bytes: 0,
        })
    }

    /// Payload bytes written so far, saturating at `u32::MAX`.
    pub fn data_bytes(&self) -> u32 {
        self.data_bytes
    }

    /// Stream offset of the data chunk's size field.
    pub fn data_size_pos(&self) -> u32 {
        self.start + DATA_SIZE_OFFSET
    }

    /// Append interleaved samples.
    ///
    /// Samples are staged one storage block (512 bytes) at a time, so a span
    /// of up to 256 samples reaches the stream as a single write.
    pub fn write_samples(&mut self, samples: &[i16]) -> Result<(), S::Error> {
        let mut staging = [0u8; FILE_BLOCK_BYTES];

        for chunk in samples.chunks(FILE_BLOCK_BYTES / 2) {
            let bytes = &mut staging[..chunk.len() * 2];
            for (dst, &s) in bytes.chunks_exact_mut(2).zip(chunk) {
                dst.copy_from_slice(&s.to_le_bytes());
            }
            write_all(&mut self.stream, bytes)?;
            self.data_bytes = self.data_bytes.saturating_add(bytes.len() as u32);
        }
        Ok(())
    }

    /// Patch both size fields, then flush and close the stream.
    pub fn finalize(mut self) -> Result<WavSummary, S::Error> {
        let end = self.stream.position().map_err(RecordError::Storage)?;
        let data_start = self.start + HEADER_LEN as u32;
        let data_bytes = end - data_start;
        let file_bytes = end - self.start;

        self.stream
            .seek(self.data_size_pos())
            .map_err(RecordError::Storage)?;
        write_all(&mut self.stream, &data_bytes.to_le_bytes())?;

        self.stream
            .seek(self.start + RIFF_SIZE_OFFSET)
            .map_err(RecordError::Storage)?;
        write_all(&mut self.stream, &(file_bytes - 8).to_le_bytes())?;

        self.stream.flush().map_err(RecordError::Storage)?;
        self.stream.close().map_err(RecordError::Storage)?;

        info!(data_bytes, file_bytes, "wav finalized");
        Ok(WavSummary {
            data_bytes,
            file_bytes,
        })
    }
}
