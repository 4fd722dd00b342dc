//! Test fixture utilities for creating WAV inputs.

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use tempfile::TempDir;
use wavshape_audio::{FormatDescriptor, SampleDepth, WavStreamWriter};

/// A temporary directory holding input and output files for one test.
pub struct AudioFixture {
    pub root: TempDir,
}

impl AudioFixture {
    /// Create a new empty fixture directory.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        Self { root }
    }

    /// Get the fixture root path.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Path for a file inside the fixture.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Write a mono WAV with the given samples through [`WavStreamWriter`].
    pub fn write_mono(
        &self,
        name: &str,
        sample_rate: u32,
        depth: SampleDepth,
        samples: &[f32],
    ) -> PathBuf {
        let path = self.file(name);
        let mut writer = WavStreamWriter::create(&path, FormatDescriptor::mono(sample_rate, depth))
            .expect("Failed to create WAV");
        writer.write_block(samples, None).expect("Failed to write samples");
        writer.close().expect("Failed to close WAV");
        path
    }

    /// Write a stereo WAV with the given channels through [`WavStreamWriter`].
    pub fn write_stereo(
        &self,
        name: &str,
        sample_rate: u32,
        depth: SampleDepth,
        left: &[f32],
        right: &[f32],
    ) -> PathBuf {
        let path = self.file(name);
        let mut writer =
            WavStreamWriter::create(&path, FormatDescriptor::stereo(sample_rate, depth))
                .expect("Failed to create WAV");
        writer
            .write_block(left, Some(right))
            .expect("Failed to write samples");
        writer.close().expect("Failed to close WAV");
        path
    }

    /// Write raw bytes as a file.
    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.file(name);
        fs::write(&path, bytes).expect("Failed to write file");
        path
    }
}

impl Default for AudioFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A sine tone.
pub fn sine(frequency: f32, sample_rate: u32, frames: usize, amplitude: f32) -> Vec<f32> {
    (0..frames)
        .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Builds RIFF/WAVE byte streams chunk by chunk, including malformed ones.
///
/// Chunks are emitted in the order added. Odd-sized payloads get a pad byte
/// unless `unpadded` is used. The RIFF size is computed on [`Self::build`]
/// unless overridden.
#[derive(Debug, Clone)]
pub struct RiffBuilder {
    riff_id: [u8; 4],
    form: [u8; 4],
    riff_size: Option<u32>,
    body: Vec<u8>,
}

impl RiffBuilder {
    /// An empty `RIFF....WAVE` form.
    pub fn new() -> Self {
        Self {
            riff_id: *b"RIFF",
            form: *b"WAVE",
            riff_size: None,
            body: Vec::new(),
        }
    }

    /// Replace the outer tag.
    pub fn riff_id(mut self, id: &[u8; 4]) -> Self {
        self.riff_id = *id;
        self
    }

    /// Replace the form type.
    pub fn form(mut self, form: &[u8; 4]) -> Self {
        self.form = *form;
        self
    }

    /// Declare a specific RIFF size instead of the computed one.
    pub fn riff_size(mut self, size: u32) -> Self {
        self.riff_size = Some(size);
        self
    }

    /// Append a chunk with its payload, padded to even length.
    pub fn chunk(mut self, id: &[u8; 4], payload: &[u8]) -> Self {
        self.push_header(id, payload.len() as u32);
        self.body.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            self.body.push(0);
        }
        self
    }

    /// Append a chunk header declaring `size` followed by `payload` as is.
    pub fn chunk_declared(mut self, id: &[u8; 4], size: u32, payload: &[u8]) -> Self {
        self.push_header(id, size);
        self.body.extend_from_slice(payload);
        self
    }

    /// Append a canonical 16-byte PCM `fmt ` chunk.
    pub fn fmt_pcm(self, channels: u16, sample_rate: u32, bits: u16) -> Self {
        let payload = fmt_payload(1, channels, sample_rate, bits);
        self.chunk(b"fmt ", &payload)
    }

    /// Append a `fmt ` chunk with an arbitrary encoding tag.
    pub fn fmt_tagged(self, tag: u16, channels: u16, sample_rate: u32, bits: u16) -> Self {
        let payload = fmt_payload(tag, channels, sample_rate, bits);
        self.chunk(b"fmt ", &payload)
    }

    /// Append a 40-byte WAVE_FORMAT_EXTENSIBLE `fmt ` chunk with a PCM sub-format.
    pub fn fmt_extensible(self, channels: u16, sample_rate: u32, bits: u16) -> Self {
        let mut payload = fmt_payload(0xFFFE, channels, sample_rate, bits);
        payload.write_u16::<LittleEndian>(22).unwrap();
        payload.write_u16::<LittleEndian>(bits).unwrap();
        payload.write_u32::<LittleEndian>(0).unwrap();
        // KSDATAFORMAT_SUBTYPE_PCM
        payload.write_u16::<LittleEndian>(1).unwrap();
        payload.extend_from_slice(&[
            0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
        ]);
        self.chunk(b"fmt ", &payload)
    }

    /// Append a `data` chunk of 16-bit samples.
    pub fn data_i16(self, samples: &[i16]) -> Self {
        let mut payload = Vec::with_capacity(samples.len() * 2);
        for &s in samples {
            payload.write_i16::<LittleEndian>(s).unwrap();
        }
        self.chunk(b"data", &payload)
    }

    /// Serialize the stream.
    pub fn build(self) -> Vec<u8> {
        let size = self
            .riff_size
            .unwrap_or(4 + self.body.len() as u32);
        let mut out = Vec::with_capacity(12 + self.body.len());
        out.extend_from_slice(&self.riff_id);
        out.write_u32::<LittleEndian>(size).unwrap();
        out.extend_from_slice(&self.form);
        out.extend_from_slice(&self.body);
        out
    }

    fn push_header(&mut self, id: &[u8; 4], size: u32) {
        self.body.extend_from_slice(id);
        self.body.write_u32::<LittleEndian>(size).unwrap();
    }
}

impl Default for RiffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn fmt_payload(tag: u16, channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * bits.div_ceil(8);
    let mut payload = Vec::with_capacity(16);
    payload.write_u16::<LittleEndian>(tag).unwrap();
    payload.write_u16::<LittleEndian>(channels).unwrap();
    payload.write_u32::<LittleEndian>(sample_rate).unwrap();
    payload
        .write_u32::<LittleEndian>(sample_rate.wrapping_mul(u32::from(block_align)))
        .unwrap();
    payload.write_u16::<LittleEndian>(block_align).unwrap();
    payload.write_u16::<LittleEndian>(bits).unwrap();
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_shape() {
        let tone = sine(1000.0, 8000, 8, 0.5);
        assert_eq!(tone.len(), 8);
        assert_eq!(tone[0], 0.0);
        assert!((tone[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_builder_minimal_stream() {
        let bytes = RiffBuilder::new()
            .fmt_pcm(1, 8000, 16)
            .data_i16(&[1, -1])
            .build();
        assert_eq!(bytes.len(), 48);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 40);
        assert_eq!(&bytes[36..40], b"data");
    }

    #[test]
    fn test_builder_pads_odd_chunks() {
        let bytes = RiffBuilder::new().chunk(b"LIST", &[1, 2, 3]).build();
        assert_eq!(bytes.len(), 12 + 8 + 4);
    }

    #[test]
    fn test_fixture_writes_files() {
        let fixture = AudioFixture::new();
        let path = fixture.write_mono("a.wav", 8000, SampleDepth::Pcm16, &[0.0; 10]);
        assert!(path.starts_with(fixture.path()));
        assert_eq!(fs::metadata(&path).unwrap().len(), 64);
    }
}
