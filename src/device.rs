//! The I/O boundary: [`InputDevice`] / [`OutputDevice`].
//!
//! The core never talks to `std::fs`/`std::net` directly — it reads and
//! writes through these two traits, so callers can plug in files, memory
//! buffers, or anything else that looks like a seekable byte stream.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use crate::error::PdfResult;

/// A byte source with look-ahead and seek, consumed by the tokenizer.
pub trait InputDevice {
    /// Read up to `buf.len()` bytes, returning the number actually read
    /// (`0` at end of input).
    fn read(&mut self, buf: &mut [u8]) -> PdfResult<usize>;

    /// Read up to `buf.len()` bytes without advancing the read position.
    fn peek(&mut self, buf: &mut [u8]) -> PdfResult<usize>;

    /// Reposition the device.
    fn seek(&mut self, pos: SeekFrom) -> PdfResult<u64>;

    /// The current byte offset.
    fn tell(&mut self) -> PdfResult<u64>;

    /// The total length of the underlying data.
    fn len(&mut self) -> PdfResult<u64>;
}

/// A byte sink with `tell`/`seek`/`flush`, consumed by the object writer.
pub trait OutputDevice {
    /// Write all of `buf`.
    fn write(&mut self, buf: &[u8]) -> PdfResult<()>;

    /// The current byte offset (used to record xref offsets as objects are
    /// written).
    fn tell(&self) -> u64;

    /// Reposition the device (used by the file-backed stream path to patch
    /// a pre-reserved `/Length` value after `end_append`).
    fn seek(&mut self, pos: u64) -> PdfResult<()>;

    /// Flush any buffered output.
    fn flush(&mut self) -> PdfResult<()>;
}

impl InputDevice for Cursor<&[u8]> {
    fn read(&mut self, buf: &mut [u8]) -> PdfResult<usize> {
        Ok(Read::read(self, buf)?)
    }

    fn peek(&mut self, buf: &mut [u8]) -> PdfResult<usize> {
        let pos = self.position();
        let n = Read::read(self, buf)?;
        self.set_position(pos);
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> PdfResult<u64> {
        Ok(Seek::seek(self, pos)?)
    }

    fn tell(&mut self) -> PdfResult<u64> {
        Ok(self.position())
    }

    fn len(&mut self) -> PdfResult<u64> {
        Ok(self.get_ref().len() as u64)
    }
}

impl InputDevice for Cursor<Vec<u8>> {
    fn read(&mut self, buf: &mut [u8]) -> PdfResult<usize> {
        Ok(Read::read(self, buf)?)
    }

    fn peek(&mut self, buf: &mut [u8]) -> PdfResult<usize> {
        let pos = self.position();
        let n = Read::read(self, buf)?;
        self.set_position(pos);
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> PdfResult<u64> {
        Ok(Seek::seek(self, pos)?)
    }

    fn tell(&mut self) -> PdfResult<u64> {
        Ok(self.position())
    }

    fn len(&mut self) -> PdfResult<u64> {
        Ok(self.get_ref().len() as u64)
    }
}

/// A growable in-memory output device, the default sink used by tests and
/// by callers who want the finished bytes in RAM rather than on disk.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    buf: Vec<u8>,
}

impl MemoryOutput {
    /// An empty output buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the device, returning the written bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

impl OutputDevice for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> PdfResult<()> {
        self.buf.extend_from_slice(buf);
        Ok(())
    }

    fn tell(&self) -> u64 {
        self.buf.len() as u64
    }

    fn seek(&mut self, pos: u64) -> PdfResult<()> {
        // Growing writes at an offset beyond the current end are padded
        // with zero bytes, matching a regular file's sparse-write
        // semantics (used when patching a pre-reserved `/Length` value).
        if pos as usize > self.buf.len() {
            self.buf.resize(pos as usize, 0);
        }
        self.buf.truncate(pos as usize);
        Ok(())
    }

    fn flush(&mut self) -> PdfResult<()> {
        Ok(())
    }
}

/// An `OutputDevice` backed by a regular file, for the file-backed stream
/// path of spec.md §4.4.
pub struct FileOutput {
    file: std::fs::File,
    pos: u64,
}

impl FileOutput {
    /// Wrap an already-opened file, writing from its current position.
    pub fn new(file: std::fs::File) -> PdfResult<Self> {
        let pos = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self { file, pos })
    }
}

impl OutputDevice for FileOutput {
    fn write(&mut self, buf: &[u8]) -> PdfResult<()> {
        self.file.write_all(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, pos: u64) -> PdfResult<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    fn flush(&mut self) -> PdfResult<()> {
        Ok(self.file.flush()?)
    }
}
