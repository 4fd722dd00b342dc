//! RIFF chunk scanning.
//!
//! A RIFF stream is a sequence of `{id: 4 bytes, size: u32 LE, payload}`
//! chunks, each payload padded to an even length. [`ChunkScanner`] reads
//! headers and payload bytes from any `Read + Seek` source and reports how
//! many bytes each call consumed; callers charge those bytes to the enclosing
//! [`ChunkHeader`] themselves.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Serialize, Serializer};

use crate::error::{FormatErrorKind, WavError, WavResult};

/// Size of a chunk header (id + size) in bytes.
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// FourCC chunk identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    /// Outer RIFF container.
    pub const RIFF: ChunkId = ChunkId(*b"RIFF");
    /// WAVE form type.
    pub const WAVE: ChunkId = ChunkId(*b"WAVE");
    /// Format chunk.
    pub const FMT: ChunkId = ChunkId(*b"fmt ");
    /// Sample data chunk.
    pub const DATA: ChunkId = ChunkId(*b"data");

    /// Raw identifier bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') => {
                write!(f, "{}", s)
            }
            _ => write!(
                f,
                "0x{:02X}{:02X}{:02X}{:02X}",
                self.0[0], self.0[1], self.0[2], self.0[3]
            ),
        }
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId({:?})", self.to_string())
    }
}

impl Serialize for ChunkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A scanned chunk header plus the number of payload bytes consumed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Chunk identifier.
    pub id: ChunkId,
    /// Declared payload length.
    pub size: u32,
    /// Payload bytes consumed; never exceeds `size`.
    pub pos: u64,
}

impl ChunkHeader {
    /// Creates a header with nothing consumed yet.
    pub fn new(id: ChunkId, size: u32) -> Self {
        Self { id, size, pos: 0 }
    }

    /// Returns true if this chunk has the given identifier.
    #[inline]
    pub fn is(&self, id: ChunkId) -> bool {
        self.id == id
    }

    /// Payload bytes not yet consumed.
    #[inline]
    pub fn remaining(&self) -> u64 {
        u64::from(self.size) - self.pos
    }

    /// Pad byte count following the payload (0 or 1).
    #[inline]
    pub fn padding(&self) -> u64 {
        u64::from(self.size & 1)
    }

    /// Charges `consumed` bytes to this chunk.
    ///
    /// `offset` is the stream offset reported if the chunk would overrun.
    pub fn advance(&mut self, consumed: u64, offset: u64) -> WavResult<()> {
        if consumed > self.remaining() {
            return Err(WavError::format(FormatErrorKind::ChunkOverrun, offset));
        }
        self.pos += consumed;
        Ok(())
    }
}

/// Location of a chunk within the stream, kept for layout inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkRecord {
    /// Chunk identifier.
    pub id: ChunkId,
    /// Declared payload length.
    pub size: u32,
    /// Absolute offset of the chunk header.
    pub offset: u64,
}

/// Reads chunk headers and payload bytes while tracking the stream offset.
#[derive(Debug)]
pub struct ChunkScanner<R> {
    inner: R,
    offset: u64,
}

impl<R: Read + Seek> ChunkScanner<R> {
    /// Wraps a stream positioned at its first byte.
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Absolute offset of the next byte to be read.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consumes the scanner, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads a 4-byte identifier.
    pub fn read_id(&mut self) -> WavResult<(ChunkId, u64)> {
        let mut id = [0u8; 4];
        let consumed = self.read_bytes(&mut id)?;
        Ok((ChunkId(id), consumed))
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> WavResult<(u32, u64)> {
        let value = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(|e| WavError::read(e, self.offset))?;
        self.offset += 4;
        Ok((value, 4))
    }

    /// Reads a chunk header.
    pub fn read_header(&mut self) -> WavResult<(ChunkHeader, u64)> {
        let (id, id_len) = self.read_id()?;
        let (size, size_len) = self.read_u32()?;
        Ok((ChunkHeader::new(id, size), id_len + size_len))
    }

    /// Reads a chunk header, returning `None` if the stream ends cleanly
    /// before the first header byte.
    pub fn next_header(&mut self) -> WavResult<Option<(ChunkHeader, u64)>> {
        let mut id = [0u8; 4];
        let filled = self.fill(&mut id)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < id.len() {
            return Err(WavError::read(
                io::Error::new(io::ErrorKind::UnexpectedEof, "truncated chunk header"),
                self.offset,
            ));
        }
        let (size, size_len) = self.read_u32()?;
        Ok(Some((ChunkHeader::new(ChunkId(id), size), 4 + size_len)))
    }

    /// Fills `dest` completely.
    pub fn read_bytes(&mut self, dest: &mut [u8]) -> WavResult<u64> {
        self.inner
            .read_exact(dest)
            .map_err(|e| WavError::read(e, self.offset))?;
        let consumed = dest.len() as u64;
        self.offset += consumed;
        Ok(consumed)
    }

    /// Advances the stream by `n` bytes without reading them.
    pub fn skip(&mut self, n: u64) -> WavResult<u64> {
        if n == 0 {
            return Ok(0);
        }
        let delta = i64::try_from(n).map_err(|_| {
            WavError::read(
                io::Error::new(io::ErrorKind::InvalidInput, "skip distance too large"),
                self.offset,
            )
        })?;
        self.inner
            .seek(SeekFrom::Current(delta))
            .map_err(|e| WavError::read(e, self.offset))?;
        self.offset += n;
        Ok(n)
    }

    /// Skips the unread payload of `chunk` and its pad byte.
    pub fn skip_rest(&mut self, chunk: &ChunkHeader) -> WavResult<u64> {
        self.skip(chunk.remaining() + chunk.padding())
    }

    /// Reads as many bytes as available up to `dest.len()`.
    fn fill(&mut self, dest: &mut [u8]) -> WavResult<usize> {
        let mut filled = 0;
        while filled < dest.len() {
            match self.inner.read(&mut dest[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(WavError::read(e, self.offset + filled as u64)),
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }
}
