//! Streaming RIFF/WAVE reader and writer.
//!
//! Supports 16-bit and 24-bit integer PCM, mono or stereo, including
//! WAVE_FORMAT_EXTENSIBLE files with a PCM sub-format. Unknown chunks are
//! skipped; neither side ever holds more than one block of samples.

pub mod chunk;
pub mod codec;
pub mod format;
mod reader;
mod writer;

#[cfg(test)]
mod tests;

// Re-export public API
pub use chunk::{ChunkHeader, ChunkId, ChunkRecord, ChunkScanner};
pub use codec::{decode_i16, decode_i24, encode_i16, encode_i24, SampleDepth};
pub use format::{FormatDescriptor, WAVE_FORMAT_EXTENSIBLE, WAVE_FORMAT_PCM};
pub use reader::{AudioBlock, ReaderState, WavStreamReader};
pub use writer::WavStreamWriter;
