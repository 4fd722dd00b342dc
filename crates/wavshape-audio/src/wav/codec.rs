//! PCM sample conversion.
//!
//! Converts between little-endian 16/24-bit PCM and normalized `f32` samples.
//! Decoding and encoding use different scales, matching common DAW behavior:
//! decoding divides by the full negative range, encoding multiplies by the
//! positive range so that `1.0` never overflows.

/// Divisor for decoding 16-bit samples.
pub const PCM16_DECODE_SCALE: f32 = 32768.0;

/// Multiplier for encoding 16-bit samples.
pub const PCM16_ENCODE_SCALE: f32 = 32767.0;

/// Divisor for decoding 24-bit samples held in the top bytes of an `i32`.
pub const PCM24_DECODE_SCALE: f32 = (i32::MAX - 256) as f32;

/// Multiplier for encoding 24-bit samples.
pub const PCM24_ENCODE_SCALE: f32 = 8_388_608.0;

const PCM24_MIN: i32 = -8_388_608;
const PCM24_MAX: i32 = 8_388_607;

/// Decodes a little-endian signed 16-bit sample.
#[inline]
pub fn decode_i16(bytes: [u8; 2]) -> f32 {
    i16::from_le_bytes(bytes) as f32 / PCM16_DECODE_SCALE
}

/// Decodes a little-endian signed 24-bit sample.
#[inline]
pub fn decode_i24(bytes: [u8; 3]) -> f32 {
    i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) as f32 / PCM24_DECODE_SCALE
}

/// Encodes a sample as little-endian signed 16-bit, clamping to [-1, 1].
#[inline]
pub fn encode_i16(sample: f32) -> [u8; 2] {
    let value = (sample.clamp(-1.0, 1.0) * PCM16_ENCODE_SCALE) as i16;
    value.to_le_bytes()
}

/// Encodes a sample as little-endian signed 24-bit, clamping to [-1, 1].
#[inline]
pub fn encode_i24(sample: f32) -> [u8; 3] {
    let value = ((sample.clamp(-1.0, 1.0) * PCM24_ENCODE_SCALE) as i32).clamp(PCM24_MIN, PCM24_MAX);
    let bytes = value.to_le_bytes();
    [bytes[0], bytes[1], bytes[2]]
}

/// Supported PCM sample depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleDepth {
    /// 16-bit signed integer samples.
    Pcm16,
    /// 24-bit signed integer samples.
    Pcm24,
}

impl SampleDepth {
    /// Maps a `bits_per_sample` value to a depth.
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            16 => Some(SampleDepth::Pcm16),
            24 => Some(SampleDepth::Pcm24),
            _ => None,
        }
    }

    /// Bits per sample.
    pub fn bits(self) -> u16 {
        match self {
            SampleDepth::Pcm16 => 16,
            SampleDepth::Pcm24 => 24,
        }
    }

    /// Bytes per sample.
    pub fn bytes(self) -> usize {
        match self {
            SampleDepth::Pcm16 => 2,
            SampleDepth::Pcm24 => 3,
        }
    }

    /// Decodes one sample from the start of `bytes`.
    ///
    /// `bytes` must hold at least [`SampleDepth::bytes`] bytes.
    #[inline]
    pub fn decode(self, bytes: &[u8]) -> f32 {
        match self {
            SampleDepth::Pcm16 => decode_i16([bytes[0], bytes[1]]),
            SampleDepth::Pcm24 => decode_i24([bytes[0], bytes[1], bytes[2]]),
        }
    }

    /// Appends one encoded sample to `out`.
    #[inline]
    pub fn encode_into(self, sample: f32, out: &mut Vec<u8>) {
        match self {
            SampleDepth::Pcm16 => out.extend_from_slice(&encode_i16(sample)),
            SampleDepth::Pcm24 => out.extend_from_slice(&encode_i24(sample)),
        }
    }
}
