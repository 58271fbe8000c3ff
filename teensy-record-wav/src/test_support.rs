//! In-memory storage doubles shared by the unit and integration tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use crate::storage::{Storage, Volume};

/// Byte-vector stream that logs every write and fails on request.
#[derive(Debug, Default)]
pub struct ScriptedStorage {
    pub data: Vec<u8>,
    pub pos: usize,
    /// Length of every `write` call, in order.
    pub writes: Vec<usize>,
    /// Index of the `write` call that returns an error.
    pub fail_write_at: Option<usize>,
    /// Index of the `write` call that only writes half its bytes.
    pub short_write_at: Option<usize>,
    pub fail_seek: bool,
    pub flushed: bool,
    pub closed: bool,
}

impl ScriptedStorage {
    /// Samples of the `data` chunk body, assuming a 44-byte header at 0.
    pub fn payload_samples(&self) -> Vec<i16> {
        self.data[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }
}

impl Storage for ScriptedStorage {
    type Error = &'static str;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        let call = self.writes.len();
        self.writes.push(bytes.len());
        if self.fail_write_at == Some(call) {
            return Err("write failed");
        }
        let n = if self.short_write_at == Some(call) {
            bytes.len() / 2
        } else {
            bytes.len()
        };
        if self.data.len() < self.pos + n {
            self.data.resize(self.pos + n, 0);
        }
        self.data[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, offset: u32) -> Result<(), Self::Error> {
        if self.fail_seek {
            return Err("seek failed");
        }
        self.pos = offset as usize;
        Ok(())
    }

    fn position(&mut self) -> Result<u32, Self::Error> {
        Ok(self.pos as u32)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushed = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.closed = true;
        Ok(())
    }
}

/// Handle to a [`ScriptedStorage`] that the test keeps a second handle to.
#[derive(Debug, Clone, Default)]
pub struct SharedStorage(pub Rc<RefCell<ScriptedStorage>>);

impl Storage for SharedStorage {
    type Error = &'static str;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        self.0.borrow_mut().write(bytes)
    }

    fn seek(&mut self, offset: u32) -> Result<(), Self::Error> {
        self.0.borrow_mut().seek(offset)
    }

    fn position(&mut self) -> Result<u32, Self::Error> {
        self.0.borrow_mut().position()
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().flush()
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().close()
    }
}

/// Volume that hands out [`SharedStorage`] files and remembers its calls.
#[derive(Debug, Default)]
pub struct ScriptedVolume {
    pub existing: Vec<String>,
    pub removed: Vec<String>,
    pub files: Vec<(String, SharedStorage)>,
    pub fail_create: bool,
}

impl ScriptedVolume {
    /// The most recently created file.
    pub fn last_file(&self) -> Rc<RefCell<ScriptedStorage>> {
        Rc::clone(&self.files.last().expect("no file created").1 .0)
    }
}

impl Volume for ScriptedVolume {
    type File = SharedStorage;

    fn exists(&mut self, name: &str) -> bool {
        self.existing.iter().any(|n| n == name)
    }

    fn remove(&mut self, name: &str) -> Result<(), &'static str> {
        self.existing.retain(|n| n != name);
        self.removed.push(name.to_string());
        Ok(())
    }

    fn create(&mut self, name: &str) -> Result<SharedStorage, &'static str> {
        if self.fail_create {
            return Err("no card");
        }
        let file = SharedStorage::default();
        self.files.push((name.to_string(), file.clone()));
        self.existing.push(name.to_string());
        Ok(file)
    }
}

pub fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
