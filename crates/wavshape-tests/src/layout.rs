//! Independent byte-level WAV layout checker.
//!
//! Walks a RIFF/WAVE buffer without going through `wavshape-audio`, so tests
//! can check what the writer produced against a second reading of the bytes.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

/// Error type for layout failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutError {
    /// Description of what went wrong.
    pub message: String,
    /// Byte offset where the error occurred, if applicable.
    pub offset: Option<usize>,
}

impl LayoutError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }

    fn at_offset(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "WAV layout error at offset {}: {}", offset, self.message),
            None => write!(f, "WAV layout error: {}", self.message),
        }
    }
}

impl std::error::Error for LayoutError {}

/// One chunk found in the WAVE form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Four-character identifier.
    pub id: [u8; 4],
    /// Declared payload size.
    pub size: u32,
    /// Offset of the chunk header.
    pub offset: usize,
}

/// Layout of a WAV buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavLayout {
    /// Declared RIFF size.
    pub riff_size: u32,
    /// Chunks inside the WAVE form, in order.
    pub chunks: Vec<ChunkSpan>,
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Block alignment.
    pub block_align: u16,
    /// Offset of the first sample byte.
    pub data_offset: usize,
    /// Declared data size.
    pub data_size: u32,
}

impl WavLayout {
    /// Frames per channel declared by the data chunk.
    pub fn frames(&self) -> usize {
        if self.block_align == 0 {
            return 0;
        }
        self.data_size as usize / self.block_align as usize
    }

    /// The sample bytes, as a slice of `bytes`.
    pub fn data<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.data_offset..self.data_offset + self.data_size as usize]
    }
}

/// Walk the chunk list of a WAV buffer.
///
/// Checks that the RIFF size matches the buffer, every chunk fits inside the
/// form, odd chunks are padded, and `fmt ` precedes `data`.
pub fn check_layout(bytes: &[u8]) -> Result<WavLayout, LayoutError> {
    if bytes.len() < 12 {
        return Err(LayoutError::new(format!(
            "buffer too short: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[0..4] != b"RIFF" {
        return Err(LayoutError::at_offset("missing RIFF tag", 0));
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(LayoutError::at_offset("missing WAVE form type", 8));
    }

    let riff_size = LittleEndian::read_u32(&bytes[4..8]);
    let form_end = 8 + riff_size as usize;
    if form_end != bytes.len() {
        return Err(LayoutError::at_offset(
            format!(
                "RIFF size {} implies {} bytes, buffer has {}",
                riff_size,
                form_end,
                bytes.len()
            ),
            4,
        ));
    }

    let mut chunks = Vec::new();
    let mut fmt: Option<(u16, u32, u16, u16)> = None;
    let mut data: Option<(usize, u32)> = None;
    let mut offset = 12;

    while offset < form_end {
        if offset + 8 > form_end {
            return Err(LayoutError::at_offset("truncated chunk header", offset));
        }
        let mut id = [0u8; 4];
        id.copy_from_slice(&bytes[offset..offset + 4]);
        let size = LittleEndian::read_u32(&bytes[offset + 4..offset + 8]);
        let payload = offset + 8;
        let padded = size as usize + (size as usize & 1);
        if payload + padded > form_end {
            return Err(LayoutError::at_offset(
                format!("chunk '{}' overruns the form", String::from_utf8_lossy(&id)),
                offset,
            ));
        }

        match &id {
            b"fmt " => {
                if size < 16 {
                    return Err(LayoutError::at_offset("fmt chunk too small", offset));
                }
                let p = &bytes[payload..payload + 16];
                fmt = Some((
                    LittleEndian::read_u16(&p[2..4]),
                    LittleEndian::read_u32(&p[4..8]),
                    LittleEndian::read_u16(&p[12..14]),
                    LittleEndian::read_u16(&p[14..16]),
                ));
            }
            b"data" => {
                if fmt.is_none() {
                    return Err(LayoutError::at_offset(
                        "data chunk found before fmt chunk",
                        offset,
                    ));
                }
                if data.is_none() {
                    data = Some((payload, size));
                }
            }
            _ => {}
        }

        chunks.push(ChunkSpan { id, size, offset });
        offset = payload + padded;
    }

    let (channels, sample_rate, block_align, bits_per_sample) =
        fmt.ok_or_else(|| LayoutError::new("missing fmt chunk"))?;
    let (data_offset, data_size) = data.ok_or_else(|| LayoutError::new("missing data chunk"))?;

    Ok(WavLayout {
        riff_size,
        chunks,
        channels,
        sample_rate,
        bits_per_sample,
        block_align,
        data_offset,
        data_size,
    })
}
