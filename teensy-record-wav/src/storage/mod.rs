//! Storage seams for the recorder.
//!
//! The recorder never talks to an SD card or file system directly. It writes
//! through a [`Storage`] stream, which it either receives from the caller or
//! opens by name on a [`Volume`].
//!
//! Offsets are `u32`, matching the 4 GiB limit of both FAT32 and RIFF.

#[cfg(any(test, feature = "std"))]
mod std_io;

#[cfg(any(test, feature = "std"))]
pub use std_io::{DirVolume, IoStorage};

use core::fmt::Debug;

/// A seekable, writable byte stream (e.g. an open file on an SD card).
pub trait Storage {
    /// Error type for stream operations.
    type Error: Debug;

    /// Write bytes at the current position, returning how many were written.
    ///
    /// Callers treat a count smaller than `bytes.len()` as a failed write.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error>;

    /// Move the write position to `offset` bytes from the start of the stream.
    fn seek(&mut self, offset: u32) -> Result<(), Self::Error>;

    /// Current write position in bytes from the start of the stream.
    fn position(&mut self) -> Result<u32, Self::Error>;

    /// Push buffered data to the medium.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Flush and release the stream. No further calls follow.
    fn close(&mut self) -> Result<(), Self::Error>;
}

/// A file system the recorder can open output files on.
pub trait Volume {
    /// Stream type returned by [`create`](Volume::create).
    type File: Storage;

    /// Whether a file called `name` exists.
    fn exists(&mut self, name: &str) -> bool;

    /// Delete the file called `name`.
    fn remove(&mut self, name: &str) -> Result<(), <Self::File as Storage>::Error>;

    /// Create (or truncate) `name` and open it for writing at offset 0.
    fn create(&mut self, name: &str) -> Result<Self::File, <Self::File as Storage>::Error>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    type Error = S::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        (**self).write(bytes)
    }

    fn seek(&mut self, offset: u32) -> Result<(), Self::Error> {
        (**self).seek(offset)
    }

    fn position(&mut self) -> Result<u32, Self::Error> {
        (**self).position()
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close()
    }
}
