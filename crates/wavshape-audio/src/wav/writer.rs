//! Streaming WAV writer.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::{debug, warn};

use super::chunk::ChunkId;
use super::codec::SampleDepth;
use super::format::{FormatDescriptor, PCM_FMT_SIZE};
use crate::error::{StateErrorKind, WavError, WavResult};

/// Bytes between the RIFF size field and the data payload: `WAVE`, the `fmt `
/// chunk and the `data` header.
const RIFF_OVERHEAD: u64 = 4 + 8 + PCM_FMT_SIZE as u64 + 8;

/// Writes PCM frames to a RIFF/WAVE stream as they arrive.
///
/// Headers go out first with placeholder sizes; [`close`](Self::close)
/// patches them from the frame counter. Dropping an unclosed writer closes it
/// on a best-effort basis.
#[derive(Debug)]
pub struct WavStreamWriter<W: Write + Seek> {
    inner: Option<W>,
    format: FormatDescriptor,
    depth: SampleDepth,
    riff_size_offset: u64,
    data_size_offset: u64,
    data_start: u64,
    written_frames: u64,
    scratch: Vec<u8>,
    closed: bool,
}

impl WavStreamWriter<BufWriter<File>> {
    /// Creates (or truncates) a file and writes the header.
    pub fn create(path: impl AsRef<Path>, format: FormatDescriptor) -> WavResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| WavError::open(path, e))?;
        Self::new(BufWriter::new(file), format)
    }
}

impl<W: Write + Seek> WavStreamWriter<W> {
    /// Writes the RIFF, `fmt ` and `data` headers to `inner`.
    ///
    /// Only mono/stereo 16/24-bit PCM is accepted. The `fmt ` chunk is always
    /// written in its canonical 16-byte PCM form.
    pub fn new(mut inner: W, format: FormatDescriptor) -> WavResult<Self> {
        let start = inner.stream_position().map_err(|e| WavError::write(e, 0))?;
        let depth = format.validate_stream(start)?;
        let format = FormatDescriptor::pcm(format.channels, format.sample_rate, depth);

        write_header(&mut inner, &format).map_err(|e| WavError::write(e, start))?;

        let riff_size_offset = start + 4;
        let data_size_offset = start + 12 + 8 + u64::from(PCM_FMT_SIZE) + 4;
        Ok(Self {
            inner: Some(inner),
            format,
            depth,
            riff_size_offset,
            data_size_offset,
            data_start: data_size_offset + 4,
            written_frames: 0,
            scratch: Vec::new(),
            closed: false,
        })
    }

    /// Encodes and appends one block of frames.
    ///
    /// `right` is required for stereo and ignored for mono.
    pub fn write_block(&mut self, left: &[f32], right: Option<&[f32]>) -> WavResult<()> {
        if self.closed {
            return Err(WavError::State(StateErrorKind::Closed));
        }

        let right = match (self.format.channels, right) {
            (1, Some(_)) => {
                debug!("ignoring right channel data for mono stream");
                None
            }
            (1, None) => None,
            (_, None) => return Err(WavError::MissingChannelData),
            (_, Some(r)) if r.len() != left.len() => {
                return Err(WavError::ChannelLengthMismatch {
                    left: left.len(),
                    right: r.len(),
                })
            }
            (_, Some(r)) => Some(r),
        };

        self.scratch.clear();
        match right {
            Some(right) => {
                for (&l, &r) in left.iter().zip(right) {
                    self.depth.encode_into(l, &mut self.scratch);
                    self.depth.encode_into(r, &mut self.scratch);
                }
            }
            None => {
                for &l in left {
                    self.depth.encode_into(l, &mut self.scratch);
                }
            }
        }

        let offset = self.data_start + self.data_bytes();
        let inner = self
            .inner
            .as_mut()
            .ok_or(WavError::State(StateErrorKind::Closed))?;
        inner
            .write_all(&self.scratch)
            .map_err(|e| WavError::write(e, offset))?;
        self.written_frames += left.len() as u64;
        Ok(())
    }

    /// Pads the data chunk, patches both size fields and flushes.
    ///
    /// Sizes come from the frame counter; the stream position must agree with
    /// it. Closing twice is a no-op.
    pub fn close(&mut self) -> WavResult<()> {
        if self.closed {
            return Ok(());
        }
        let data_bytes = self.data_bytes();
        let data_end = self.data_start + data_bytes;
        let padded = data_bytes + (data_bytes & 1);
        let riff_size = u32::try_from(RIFF_OVERHEAD + padded).map_err(|_| {
            WavError::write(
                io::Error::new(io::ErrorKind::InvalidData, "data exceeds RIFF size limit"),
                data_end,
            )
        })?;

        let inner = self
            .inner
            .as_mut()
            .ok_or(WavError::State(StateErrorKind::Closed))?;

        let position = inner
            .stream_position()
            .map_err(|e| WavError::write(e, data_end))?;
        if position != data_end {
            return Err(WavError::write(
                io::Error::new(
                    io::ErrorKind::Other,
                    format!(
                        "stream at byte {} but {} frames imply byte {}",
                        position, self.written_frames, data_end
                    ),
                ),
                position,
            ));
        }

        patch_sizes(
            inner,
            data_bytes,
            riff_size,
            self.riff_size_offset,
            self.data_size_offset,
            self.data_start + padded,
        )
        .map_err(|e| WavError::write(e, data_end))?;

        self.closed = true;
        debug!(
            frames = self.written_frames,
            data_bytes, "closed WAV stream"
        );
        Ok(())
    }

    /// Closes the stream and returns the underlying writer.
    pub fn finish(mut self) -> WavResult<W> {
        self.close()?;
        self.inner
            .take()
            .ok_or(WavError::State(StateErrorKind::Closed))
    }

    /// Frames written per channel.
    pub fn written_frames(&self) -> u64 {
        self.written_frames
    }

    /// Format written to the `fmt ` chunk.
    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    /// True once [`close`](Self::close) has succeeded.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }

    fn data_bytes(&self) -> u64 {
        self.written_frames * self.format.frame_size() as u64
    }
}

impl<W: Write + Seek> Drop for WavStreamWriter<W> {
    fn drop(&mut self) {
        if self.closed || self.inner.is_none() {
            return;
        }
        if let Err(e) = self.close() {
            warn!("failed to finalize WAV stream on drop: {}", e);
        }
    }
}

fn write_header<W: Write>(out: &mut W, format: &FormatDescriptor) -> io::Result<()> {
    out.write_all(ChunkId::RIFF.as_bytes())?;
    out.write_u32::<LittleEndian>(0)?;
    out.write_all(ChunkId::WAVE.as_bytes())?;

    out.write_all(ChunkId::FMT.as_bytes())?;
    out.write_u32::<LittleEndian>(PCM_FMT_SIZE)?;
    format.write_pcm_payload(out)?;

    out.write_all(ChunkId::DATA.as_bytes())?;
    out.write_u32::<LittleEndian>(0)?;
    Ok(())
}

fn patch_sizes<W: Write + Seek>(
    out: &mut W,
    data_bytes: u64,
    riff_size: u32,
    riff_size_offset: u64,
    data_size_offset: u64,
    end: u64,
) -> io::Result<()> {
    if data_bytes % 2 == 1 {
        out.write_u8(0)?;
    }
    out.seek(SeekFrom::Start(riff_size_offset))?;
    out.write_u32::<LittleEndian>(riff_size)?;
    out.seek(SeekFrom::Start(data_size_offset))?;
    // riff_size fits in u32, so the data size does too
    out.write_u32::<LittleEndian>(data_bytes as u32)?;
    out.seek(SeekFrom::Start(end))?;
    out.flush()
}
