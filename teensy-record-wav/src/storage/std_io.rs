//! `std` adapters: any `Write + Seek` as [`Storage`], a directory as [`Volume`].

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::PathBuf;

use super::{Storage, Volume};

/// [`Storage`] over any `std::io` stream (a `File`, a `Cursor<Vec<u8>>`, ...).
#[derive(Debug, Default)]
pub struct IoStorage<T> {
    inner: T,
}

impl<T> IoStorage<T> {
    pub fn new(inner: T) -> Self {
        IoStorage { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Write + Seek> Storage for IoStorage<T> {
    type Error = io::Error;

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        // a short write is only reported once the stream gives up
        self.inner.write_all(bytes)?;
        Ok(bytes.len())
    }

    fn seek(&mut self, offset: u32) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(u64::from(offset)))?;
        Ok(())
    }

    fn position(&mut self) -> io::Result<u32> {
        let pos = self.inner.stream_position()?;
        u32::try_from(pos)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset exceeds 4 GiB"))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// [`Volume`] rooted at a directory on the host file system.
#[derive(Debug, Clone)]
pub struct DirVolume {
    root: PathBuf,
}

impl DirVolume {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirVolume { root: root.into() }
    }

    /// Full host path of `name` on this volume.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Volume for DirVolume {
    type File = IoStorage<File>;

    fn exists(&mut self, name: &str) -> bool {
        self.path_of(name).exists()
    }

    fn remove(&mut self, name: &str) -> io::Result<()> {
        fs::remove_file(self.path_of(name))
    }

    fn create(&mut self, name: &str) -> io::Result<IoStorage<File>> {
        let file = File::create(self.path_of(name))?;
        Ok(IoStorage::new(file))
    }
}
