//! Request-scoped staging for mesh bytes.
//!
//! Uploads are already in memory once the request body is read; remote
//! fetches spool to a named temp file so a large download never sits on the
//! heap. Either way the bytes live exactly as long as the request: dropping
//! a [`StagedBytes`] removes any backing file.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use tempfile::NamedTempFile;

/// Mesh bytes staged for rendering.
#[derive(Debug)]
pub enum StagedBytes {
    /// Bytes held in memory (uploads).
    Memory(Vec<u8>),
    /// Bytes spooled to a temp file (remote fetches). The file is deleted
    /// when this value drops.
    Spooled { file: NamedTempFile, len: u64 },
}

impl StagedBytes {
    /// Number of staged bytes.
    pub fn len(&self) -> u64 {
        match self {
            StagedBytes::Memory(bytes) => bytes.len() as u64,
            StagedBytes::Spooled { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Open a fresh reader over the staged bytes, positioned at the start.
    pub fn reader(&self) -> io::Result<StagedReader<'_>> {
        match self {
            StagedBytes::Memory(bytes) => Ok(StagedReader::Memory(Cursor::new(bytes.as_slice()))),
            StagedBytes::Spooled { file, .. } => Ok(StagedReader::File(file.reopen()?)),
        }
    }

    /// Path of the backing spool file, when one exists.
    pub fn path(&self) -> Option<&Path> {
        match self {
            StagedBytes::Memory(_) => None,
            StagedBytes::Spooled { file, .. } => Some(file.path()),
        }
    }
}

/// `Read + Seek` view over [`StagedBytes`].
#[derive(Debug)]
pub enum StagedReader<'a> {
    Memory(Cursor<&'a [u8]>),
    File(File),
}

impl Read for StagedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            StagedReader::Memory(cursor) => cursor.read(buf),
            StagedReader::File(file) => file.read(buf),
        }
    }
}

impl Seek for StagedReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            StagedReader::Memory(cursor) => cursor.seek(pos),
            StagedReader::File(file) => file.seek(pos),
        }
    }
}
