//! WAV format descriptor (`fmt ` chunk).

use std::io::{self, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use serde::Serialize;

use super::codec::SampleDepth;
use crate::error::{FormatErrorKind, WavError, WavResult};

/// `audio_format` code for integer PCM.
pub const WAVE_FORMAT_PCM: u16 = 0x0001;

/// `audio_format` code for WAVE_FORMAT_EXTENSIBLE.
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size of the canonical PCM `fmt ` payload.
pub const PCM_FMT_SIZE: u32 = 16;

/// Smallest `fmt ` payload holding the mandatory fields.
const MIN_FMT_SIZE: usize = 14;

/// Longest prefix of the `fmt ` payload that is ever interpreted.
/// Covers the 22-byte WAVE_FORMAT_EXTENSIBLE extension.
pub(crate) const FMT_READ_LIMIT: usize = 40;

/// Fields of a `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    /// Encoding code (1 = PCM, 0xFFFE = extensible).
    pub audio_format: u16,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// Bytes per second.
    pub byte_rate: u32,
    /// Bytes per frame.
    pub block_align: u16,
    /// Bits per sample (0 if the chunk was too short to carry it).
    pub bits_per_sample: u16,
    /// Length of the extension area.
    pub extra_size: u16,
    /// Declared `fmt ` payload size.
    pub fmt_size: u32,
    /// Sub-format code from the extensible GUID, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_format: Option<u16>,
}

impl FormatDescriptor {
    /// Creates a canonical PCM descriptor.
    pub fn pcm(channels: u16, sample_rate: u32, depth: SampleDepth) -> Self {
        let block_align = channels * depth.bytes() as u16;
        Self {
            audio_format: WAVE_FORMAT_PCM,
            channels,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(u32::from(block_align)),
            block_align,
            bits_per_sample: depth.bits(),
            extra_size: 0,
            fmt_size: PCM_FMT_SIZE,
            sub_format: None,
        }
    }

    /// Creates a mono PCM descriptor.
    pub fn mono(sample_rate: u32, depth: SampleDepth) -> Self {
        Self::pcm(1, sample_rate, depth)
    }

    /// Creates a stereo PCM descriptor.
    pub fn stereo(sample_rate: u32, depth: SampleDepth) -> Self {
        Self::pcm(2, sample_rate, depth)
    }

    /// Decodes the leading bytes of a `fmt ` payload.
    ///
    /// `fmt_size` is the declared chunk size; `payload` may be a prefix of it.
    /// Fields are read in order, each only if the declared size covers it.
    pub fn parse(payload: &[u8], fmt_size: u32, offset: u64) -> WavResult<Self> {
        if payload.len() < MIN_FMT_SIZE {
            return Err(WavError::format(FormatErrorKind::ShortFmt, offset));
        }

        let mut desc = Self {
            audio_format: LittleEndian::read_u16(&payload[0..2]),
            channels: LittleEndian::read_u16(&payload[2..4]),
            sample_rate: LittleEndian::read_u32(&payload[4..8]),
            byte_rate: LittleEndian::read_u32(&payload[8..12]),
            block_align: LittleEndian::read_u16(&payload[12..14]),
            bits_per_sample: 0,
            extra_size: 0,
            fmt_size,
            sub_format: None,
        };

        if payload.len() >= 16 {
            desc.bits_per_sample = LittleEndian::read_u16(&payload[14..16]);
        }
        if payload.len() >= 18 {
            desc.extra_size = LittleEndian::read_u16(&payload[16..18]);
            let extra = &payload[18..];
            // valid_bits (2), channel_mask (4), then the GUID whose first two
            // bytes are the sub-format code
            if desc.audio_format == WAVE_FORMAT_EXTENSIBLE
                && desc.extra_size >= 8
                && extra.len() >= 8
            {
                desc.sub_format = Some(LittleEndian::read_u16(&extra[6..8]));
            }
        }

        Ok(desc)
    }

    /// Returns true for PCM or extensible PCM encodings.
    pub fn is_pcm(&self) -> bool {
        self.audio_format == WAVE_FORMAT_PCM
            || (self.audio_format == WAVE_FORMAT_EXTENSIBLE
                && self.sub_format == Some(WAVE_FORMAT_PCM))
    }

    /// Sample depth, if supported.
    pub fn depth(&self) -> Option<SampleDepth> {
        SampleDepth::from_bits(self.bits_per_sample)
    }

    /// Bytes per sample, per channel.
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample).div_ceil(8)
    }

    /// Bytes per interleaved frame, derived from channels and depth.
    pub fn frame_size(&self) -> usize {
        usize::from(self.channels) * self.bytes_per_sample()
    }

    /// Duration of `frames` frames in seconds.
    pub fn duration_seconds(&self, frames: u64) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        frames as f64 / f64::from(self.sample_rate)
    }

    /// Checks that samples in this format can be streamed.
    ///
    /// Encoding is checked first, then depth, then channel count.
    pub fn validate_stream(&self, offset: u64) -> WavResult<SampleDepth> {
        if !self.is_pcm() {
            return Err(WavError::format(
                FormatErrorKind::UnsupportedEncoding(self.audio_format),
                offset,
            ));
        }
        let depth = self.depth().ok_or_else(|| {
            WavError::format(
                FormatErrorKind::UnsupportedDepth(self.bits_per_sample),
                offset,
            )
        })?;
        if self.channels == 0 || self.channels > 2 {
            return Err(WavError::format(
                FormatErrorKind::UnsupportedChannels(self.channels),
                offset,
            ));
        }
        // 24-bit is the widest output depth, so its byte rate bounds the rate.
        let widest_frame = u32::from(self.channels) * SampleDepth::Pcm24.bytes() as u32;
        if self.sample_rate == 0 || self.sample_rate.checked_mul(widest_frame).is_none() {
            return Err(WavError::format(
                FormatErrorKind::UnsupportedSampleRate(self.sample_rate),
                offset,
            ));
        }
        Ok(depth)
    }

    /// Writes a canonical 16-byte PCM `fmt ` payload.
    ///
    /// `block_align` and `byte_rate` are recomputed from channels and depth.
    pub fn write_pcm_payload<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let block_align = self.frame_size() as u16;
        out.write_u16::<LittleEndian>(WAVE_FORMAT_PCM)?;
        out.write_u16::<LittleEndian>(self.channels)?;
        out.write_u32::<LittleEndian>(self.sample_rate)?;
        out.write_u32::<LittleEndian>(self.sample_rate.saturating_mul(u32::from(block_align)))?;
        out.write_u16::<LittleEndian>(block_align)?;
        out.write_u16::<LittleEndian>(self.bits_per_sample)?;
        Ok(())
    }
}
