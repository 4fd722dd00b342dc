//! wavshape audio core
//!
//! Streams PCM WAV files through a frame-based transform and writes the
//! result back out, one block at a time.
//!
//! # Overview
//!
//! The pipeline has three stages, each owning its own buffers:
//!
//! - **Reading** - [`WavStreamReader`] walks the RIFF chunk list, decodes the
//!   `fmt ` chunk and hands out decoded blocks from the `data` chunk
//! - **Processing** - [`OverlapAddProcessor`] keeps a sliding window per
//!   channel, runs a [`FrameTransform`] on it, applies a Hann window and
//!   overlap-adds the result
//! - **Writing** - [`WavStreamWriter`] encodes blocks as they arrive and
//!   patches the header sizes when closed
//!
//! Supported input is 16-bit or 24-bit integer PCM, mono or stereo.
//!
//! # Example
//!
//! ```no_run
//! use wavshape_audio::pipeline::{process_file, NoProgress, PipelineConfig};
//! use wavshape_audio::transform::Identity;
//!
//! let summary = process_file(
//!     "in.wav",
//!     "out.wav",
//!     &mut Identity,
//!     &PipelineConfig::default(),
//!     None,
//!     &mut NoProgress,
//! )?;
//! println!("wrote {} frames", summary.frames_written);
//! # Ok::<(), wavshape_audio::AudioError>(())
//! ```
//!
//! # Crate Structure
//!
//! - [`wav`] - RIFF chunk scanning, PCM codec, streaming reader and writer
//! - [`ola`] - Hann window and overlap-add processor
//! - [`transform`] - Frame transform trait, gain, chains and spectral EQ
//! - [`pipeline`] - Reader-to-writer driver with progress reporting
//! - [`stats`] - Moving average used for latency statistics
//! - [`error`] - Error types

pub mod error;
pub mod ola;
pub mod pipeline;
pub mod stats;
pub mod transform;
pub mod wav;

// Re-export main types at crate root
pub use error::{AudioError, AudioResult, WavError, WavResult};
pub use ola::{HannWindow, OverlapAddProcessor, WindowKind};
pub use pipeline::{process_file, run, PipelineConfig, PipelineSummary, ProgressObserver};
pub use transform::FrameTransform;
pub use wav::{FormatDescriptor, SampleDepth, WavStreamReader, WavStreamWriter};
