//! Streaming WAV reader.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::debug;

use super::chunk::{ChunkHeader, ChunkId, ChunkRecord, ChunkScanner, CHUNK_HEADER_SIZE};
use super::codec::SampleDepth;
use super::format::{FormatDescriptor, FMT_READ_LIMIT};
use crate::error::{FormatErrorKind, StateErrorKind, WavError, WavResult};

/// Header parsing and streaming progress of a [`WavStreamReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Nothing has been read.
    Unopened,
    /// `RIFF`/`WAVE` tags verified.
    HeaderValidated,
    /// `fmt ` chunk decoded.
    FormatLoaded,
    /// Positioned at the first sample of the `data` chunk.
    DataPositioned,
    /// At least one block has been read.
    Streaming,
    /// End-of-stream has been reported.
    Exhausted,
}

/// One decoded block, borrowed from the reader's buffers.
#[derive(Debug, Clone, Copy)]
pub struct AudioBlock<'a> {
    channels: &'a [Vec<f32>],
    valid_frames: usize,
    end_of_stream: bool,
}

impl<'a> AudioBlock<'a> {
    /// Samples of one channel, zero-padded to the requested block length.
    pub fn channel(&self, index: usize) -> &'a [f32] {
        &self.channels[index]
    }

    /// Number of channels in the block.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel, including zero padding.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Returns true if the block holds no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames that came from the file.
    pub fn valid_frames(&self) -> usize {
        self.valid_frames
    }

    /// True if this block reached the end of the data chunk.
    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }
}

/// Block-at-a-time reader over a RIFF/WAVE stream.
///
/// The reader never loads the whole file: it walks the chunk list once to
/// find `fmt ` and `data`, then decodes interleaved frames on demand into
/// per-channel buffers it owns.
#[derive(Debug)]
pub struct WavStreamReader<R> {
    scanner: ChunkScanner<R>,
    state: ReaderState,
    riff: Option<ChunkHeader>,
    format: Option<FormatDescriptor>,
    data: Option<ChunkHeader>,
    data_offset: u64,
    chunks: Vec<ChunkRecord>,
    frames_read: u64,
    raw: Vec<u8>,
    channels: Vec<Vec<f32>>,
    valid_frames: usize,
    end_of_stream: bool,
    has_block: bool,
}

impl WavStreamReader<BufReader<File>> {
    /// Opens a file and positions the reader at its sample data.
    pub fn open_path(path: impl AsRef<Path>) -> WavResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| WavError::open(path, e))?;
        Self::open(BufReader::new(file))
    }
}

impl<R: Read + Seek> WavStreamReader<R> {
    /// Wraps a stream without reading anything.
    pub fn new(inner: R) -> Self {
        Self {
            scanner: ChunkScanner::new(inner),
            state: ReaderState::Unopened,
            riff: None,
            format: None,
            data: None,
            data_offset: 0,
            chunks: Vec::new(),
            frames_read: 0,
            raw: Vec::new(),
            channels: Vec::new(),
            valid_frames: 0,
            end_of_stream: false,
            has_block: false,
        }
    }

    /// Validates the header, loads the format and locates the data chunk.
    pub fn open(inner: R) -> WavResult<Self> {
        let mut reader = Self::new(inner);
        reader.validate_header()?;
        reader.load_format()?;
        reader.locate_data()?;
        Ok(reader)
    }

    /// Checks the `RIFF` tag and the `WAVE` form type.
    pub fn validate_header(&mut self) -> WavResult<()> {
        self.expect_state(ReaderState::Unopened)?;

        let start = self.scanner.offset();
        let (id, _) = self.scanner.read_id()?;
        if id != ChunkId::RIFF {
            return Err(WavError::format(FormatErrorKind::NotRiff, start));
        }
        let (size, _) = self.scanner.read_u32()?;
        let mut riff = ChunkHeader::new(ChunkId::RIFF, size);
        self.chunks.push(ChunkRecord {
            id: ChunkId::RIFF,
            size,
            offset: start,
        });

        let form_offset = self.scanner.offset();
        let (form, consumed) = self.scanner.read_id()?;
        riff.advance(consumed, form_offset)?;
        if form != ChunkId::WAVE {
            return Err(WavError::format(FormatErrorKind::NotWave, form_offset));
        }

        self.riff = Some(riff);
        self.state = ReaderState::HeaderValidated;
        Ok(())
    }

    /// Walks sibling chunks until `fmt ` and decodes it.
    ///
    /// Unknown chunks are skipped. Meeting `data` first is an error.
    pub fn load_format(&mut self) -> WavResult<()> {
        self.expect_state(ReaderState::HeaderValidated)?;

        while let Some(mut chunk) = self.next_sibling()? {
            let at = self.scanner.offset();
            if chunk.is(ChunkId::DATA) {
                return Err(WavError::format(
                    FormatErrorKind::MissingFmt,
                    at - CHUNK_HEADER_SIZE,
                ));
            }
            if chunk.is(ChunkId::FMT) {
                let take = (chunk.size as usize).min(FMT_READ_LIMIT);
                let mut payload = vec![0u8; take];
                let consumed = self.scanner.read_bytes(&mut payload)?;
                chunk.advance(consumed, at)?;
                let format = FormatDescriptor::parse(&payload, chunk.size, at)?;
                let skipped = self.scanner.skip_rest(&chunk)?;
                self.charge_riff(consumed + skipped, at)?;

                debug!(
                    channels = format.channels,
                    sample_rate = format.sample_rate,
                    bits = format.bits_per_sample,
                    "loaded fmt chunk"
                );
                self.format = Some(format);
                self.state = ReaderState::FormatLoaded;
                return Ok(());
            }
            self.skip_unknown(&chunk)?;
        }

        Err(WavError::format(
            FormatErrorKind::MissingFmt,
            self.scanner.offset(),
        ))
    }

    /// Walks sibling chunks until `data` and positions at its first byte.
    pub fn locate_data(&mut self) -> WavResult<()> {
        self.expect_state(ReaderState::FormatLoaded)?;

        while let Some(chunk) = self.next_sibling()? {
            let at = self.scanner.offset();
            if chunk.is(ChunkId::FMT) {
                return Err(WavError::format(
                    FormatErrorKind::DuplicateFmt,
                    at - CHUNK_HEADER_SIZE,
                ));
            }
            if chunk.is(ChunkId::DATA) {
                self.charge_riff(u64::from(chunk.size), at)?;
                debug!(offset = at, size = chunk.size, "located data chunk");
                self.data = Some(chunk);
                self.data_offset = at;
                self.state = ReaderState::DataPositioned;
                return Ok(());
            }
            self.skip_unknown(&chunk)?;
        }

        Err(WavError::format(
            FormatErrorKind::NoDataChunk,
            self.scanner.offset(),
        ))
    }

    /// Reads up to `count` frames and decodes every channel.
    ///
    /// A read that cannot fill `count` frames zero-pads the remainder and
    /// marks the block as end-of-stream. Reading again after that fails with
    /// [`StateErrorKind::PastEnd`].
    pub fn read_block(&mut self, count: usize) -> WavResult<AudioBlock<'_>> {
        if count == 0 {
            return Err(WavError::ZeroLengthBlock);
        }
        let (format, depth) = self.streamable()?;

        let frame_size = format.frame_size();
        let bytes_per_sample = depth.bytes();
        let frames = self.take_frames(count, frame_size)?;

        let channel_count = usize::from(format.channels);
        self.channels.resize_with(channel_count, Vec::new);
        for buffer in &mut self.channels {
            buffer.clear();
            buffer.resize(count, 0.0);
        }
        for (i, frame) in self.raw.chunks_exact(frame_size).enumerate() {
            for (ch, buffer) in self.channels.iter_mut().enumerate() {
                buffer[i] = depth.decode(&frame[ch * bytes_per_sample..]);
            }
        }

        self.has_block = true;
        Ok(AudioBlock {
            channels: &self.channels,
            valid_frames: self.valid_frames,
            end_of_stream: self.end_of_stream,
        })
    }

    /// Per-channel block access.
    ///
    /// Channel 0 reads the next block from the file; higher channels return
    /// their part of the block decoded by that same read.
    pub fn next_audio_block(&mut self, channel: usize, count: usize) -> WavResult<&[f32]> {
        if let Some(format) = self.format {
            if channel >= usize::from(format.channels) {
                return Err(WavError::ChannelOutOfRange {
                    channel,
                    channels: format.channels,
                });
            }
        }
        if count == 0 {
            return Err(WavError::ZeroLengthBlock);
        }

        if channel == 0 {
            self.read_block(count)?;
        } else {
            self.streamable()?;
            if !self.has_block {
                return Err(WavError::State(StateErrorKind::NoBlockRead));
            }
        }
        Ok(&self.channels[channel])
    }

    /// Reads up to `max_frames` frames of undecoded interleaved bytes.
    ///
    /// Shares position and end-of-stream accounting with [`Self::read_block`].
    /// Unsupported depths can still be read raw.
    pub fn read_raw(&mut self, max_frames: usize) -> WavResult<&[u8]> {
        if max_frames == 0 {
            return Err(WavError::ZeroLengthBlock);
        }
        let format = self.positioned()?;
        if self.state == ReaderState::Exhausted {
            return Err(WavError::State(StateErrorKind::PastEnd));
        }
        let frame_size = usize::from(format.block_align.max(1));
        self.take_frames(max_frames, frame_size)?;
        Ok(&self.raw)
    }

    /// Current state.
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Decoded `fmt ` chunk, once loaded.
    pub fn format(&self) -> Option<&FormatDescriptor> {
        self.format.as_ref()
    }

    /// Total frames per channel in the data chunk; 0 before it is located.
    pub fn frames_per_channel(&self) -> u64 {
        match (self.format, self.data) {
            (Some(format), Some(data)) if format.frame_size() > 0 => {
                u64::from(data.size) / format.frame_size() as u64
            }
            _ => 0,
        }
    }

    /// Frames consumed from the data chunk so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Absolute offset of the first sample byte.
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// Declared size of the data chunk in bytes.
    pub fn data_size(&self) -> Option<u32> {
        self.data.map(|d| d.size)
    }

    /// Chunks seen while scanning the header, in file order.
    pub fn chunks(&self) -> &[ChunkRecord] {
        &self.chunks
    }

    /// True once end-of-stream has been reported.
    pub fn is_exhausted(&self) -> bool {
        self.state == ReaderState::Exhausted
    }

    /// Consumes the reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.scanner.into_inner()
    }

    fn expect_state(&self, expected: ReaderState) -> WavResult<()> {
        if self.state != expected {
            return Err(WavError::State(StateErrorKind::OutOfOrder));
        }
        Ok(())
    }

    /// Format of a reader whose data chunk has been located.
    fn positioned(&self) -> WavResult<FormatDescriptor> {
        match (self.state, self.format) {
            (
                ReaderState::DataPositioned | ReaderState::Streaming | ReaderState::Exhausted,
                Some(format),
            ) => Ok(format),
            _ => Err(WavError::State(StateErrorKind::NotPositioned)),
        }
    }

    /// Format and depth of a positioned reader whose format can be decoded.
    fn streamable(&self) -> WavResult<(FormatDescriptor, SampleDepth)> {
        let format = self.positioned()?;
        let depth = format.validate_stream(self.data_offset)?;
        Ok((format, depth))
    }

    /// Reads up to `count` frames into `raw` and updates stream accounting.
    fn take_frames(&mut self, count: usize, frame_size: usize) -> WavResult<usize> {
        if self.state == ReaderState::Exhausted {
            return Err(WavError::State(StateErrorKind::PastEnd));
        }
        let mut data = self
            .data
            .ok_or(WavError::State(StateErrorKind::NotPositioned))?;

        let available = data.remaining() / frame_size as u64;
        let frames = (count as u64).min(available) as usize;
        let bytes = frames * frame_size;

        self.raw.resize(bytes, 0);
        let at = self.scanner.offset();
        let consumed = self.scanner.read_bytes(&mut self.raw[..bytes])?;
        data.advance(consumed, at)?;
        self.data = Some(data);

        self.frames_read += frames as u64;
        self.valid_frames = frames;
        self.end_of_stream = frames < count;
        self.state = if self.end_of_stream {
            debug!(frames_read = self.frames_read, "reached end of data chunk");
            ReaderState::Exhausted
        } else {
            ReaderState::Streaming
        };
        Ok(frames)
    }

    /// Reads the next sibling header inside the WAVE form.
    ///
    /// Returns `None` once the form's declared size or the stream is used up.
    fn next_sibling(&mut self) -> WavResult<Option<ChunkHeader>> {
        let remaining = self.riff.map_or(0, |r| r.remaining());
        if remaining < CHUNK_HEADER_SIZE {
            return Ok(None);
        }
        let start = self.scanner.offset();
        let Some((chunk, consumed)) = self.scanner.next_header()? else {
            return Ok(None);
        };
        self.charge_riff(consumed, start)?;
        self.chunks.push(ChunkRecord {
            id: chunk.id,
            size: chunk.size,
            offset: start,
        });
        debug!(id = %chunk.id, size = chunk.size, offset = start, "scanned chunk");
        Ok(Some(chunk))
    }

    fn skip_unknown(&mut self, chunk: &ChunkHeader) -> WavResult<()> {
        let at = self.scanner.offset();
        let skipped = self.scanner.skip_rest(chunk)?;
        self.charge_riff(skipped, at)
    }

    fn charge_riff(&mut self, consumed: u64, offset: u64) -> WavResult<()> {
        match self.riff.as_mut() {
            Some(riff) => riff.advance(consumed, offset),
            None => Err(WavError::State(StateErrorKind::OutOfOrder)),
        }
    }
}
