//! JSON output types for machine-readable CLI output.
//!
//! Every command that accepts `--json` prints exactly one of these documents
//! to stdout, whether it succeeds or fails.

use serde::{Deserialize, Serialize};
use wavshape_audio::pipeline::PipelineSummary;
use wavshape_audio::wav::ChunkRecord;
use wavshape_audio::{AudioError, FormatDescriptor, WavError};

/// Error codes for CLI operations.
///
/// These codes are stable and can be used for programmatic error handling.
/// Library errors pass through their own `WAV_xxx` / `AUDIO_xxx` codes.
pub mod error_codes {
    /// Configuration file could not be read or parsed
    pub const CONFIG: &str = "CLI_001";
    /// Invalid command-line option value
    pub const INVALID_OPTION: &str = "CLI_002";
    /// Processing failed for a reason without a library code
    pub const PROCESSING: &str = "CLI_003";
    /// JSON serialization error
    pub const JSON_SERIALIZE: &str = "CLI_004";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "WAV_001")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// File the error relates to (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            file: None,
        }
    }

    /// Sets the file path for this error.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Converts an error chain, using the library code when one is present.
    pub fn from_anyhow(err: &anyhow::Error, fallback_code: &str) -> Self {
        let code = err
            .chain()
            .find_map(|cause| {
                cause
                    .downcast_ref::<AudioError>()
                    .map(AudioError::code)
                    .or_else(|| cause.downcast_ref::<WavError>().map(WavError::code))
            })
            .unwrap_or(fallback_code);
        Self::new(code, format!("{:#}", err))
    }
}

/// Output of `wavshape process --json`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutput {
    /// Whether processing completed
    pub success: bool,
    /// Errors, empty on success
    pub errors: Vec<JsonError>,
    /// Input path
    pub input: String,
    /// Output path
    pub output: String,
    /// Model name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Transform chain name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    /// Input format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_format: Option<FormatDescriptor>,
    /// Run summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PipelineSummary>,
}

impl ProcessOutput {
    /// Creates a failed result.
    pub fn failure(input: &str, output: &str, errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            input: input.to_string(),
            output: output.to_string(),
            model: None,
            transform: None,
            input_format: None,
            summary: None,
        }
    }
}

/// Output of `wavshape inspect --json`.
#[derive(Debug, Clone, Serialize)]
pub struct InspectOutput {
    /// Whether the file could be parsed
    pub success: bool,
    /// Errors, empty on success
    pub errors: Vec<JsonError>,
    /// Inspected path
    pub input: String,
    /// Inspection result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<InspectResult>,
}

/// Layout and format details of a WAV file.
#[derive(Debug, Clone, Serialize)]
pub struct InspectResult {
    /// Chunks in file order, starting with RIFF
    pub chunks: Vec<ChunkRecord>,
    /// Decoded `fmt ` chunk
    pub format: FormatDescriptor,
    /// Offset of the first sample byte
    pub data_offset: u64,
    /// Declared data size in bytes
    pub data_size: u32,
    /// Frames per channel
    pub frames_per_channel: u64,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Whether the format can be processed
    pub supported: bool,
    /// BLAKE3 hash of the PCM payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcm_hash: Option<String>,
}
