use core::fmt::Debug;

use thiserror::Error;

/// Errors produced by the WAV writer and recorder.
///
/// `E` is the error type of the underlying [`Storage`](crate::storage::Storage).
/// Queue overflow and partial ticks are not errors; they are counted on the
/// record queue instead.
#[derive(Debug, Error)]
pub enum RecordError<E: Debug> {
    #[error("storage error: {0:?}")]
    Storage(E),

    #[error("short write: {written} of {requested} bytes")]
    ShortWrite { requested: usize, written: usize },

    #[error("recording is already in progress")]
    AlreadyRecording,

    #[error("no recording in progress")]
    NotRecording,
}

impl<E: Debug> RecordError<E> {
    /// Whether the error came from the storage stream (as opposed to misuse).
    pub fn is_storage(&self) -> bool {
        matches!(self, RecordError::Storage(_) | RecordError::ShortWrite { .. })
    }
}

pub type Result<T, E> = core::result::Result<T, RecordError<E>>;
