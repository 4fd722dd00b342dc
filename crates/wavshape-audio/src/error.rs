//! Error types for WAV streaming and block processing.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for container-level operations.
pub type WavResult<T> = Result<T, WavError>;

/// Result type for audio processing operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Structural problems found in a RIFF/WAVE container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    /// The stream does not start with a `RIFF` tag.
    NotRiff,
    /// The RIFF form type is not `WAVE`.
    NotWave,
    /// No `fmt ` chunk precedes the `data` chunk.
    MissingFmt,
    /// A second `fmt ` chunk was found.
    DuplicateFmt,
    /// The WAVE form ended without a `data` chunk.
    NoDataChunk,
    /// A read or skip would run past the end of the enclosing chunk.
    ChunkOverrun,
    /// The `fmt ` chunk is too short to hold the mandatory fields.
    ShortFmt,
    /// The audio format is neither PCM nor extensible PCM.
    UnsupportedEncoding(u16),
    /// Only 16-bit and 24-bit samples are supported.
    UnsupportedDepth(u16),
    /// Only mono and stereo streams are supported.
    UnsupportedChannels(u16),
    /// The sample rate is zero or its byte rate does not fit in 32 bits.
    UnsupportedSampleRate(u32),
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatErrorKind::NotRiff => write!(f, "missing RIFF tag"),
            FormatErrorKind::NotWave => write!(f, "RIFF form type is not WAVE"),
            FormatErrorKind::MissingFmt => write!(f, "data chunk found before fmt chunk"),
            FormatErrorKind::DuplicateFmt => write!(f, "more than one fmt chunk"),
            FormatErrorKind::NoDataChunk => write!(f, "no data chunk in WAVE form"),
            FormatErrorKind::ChunkOverrun => write!(f, "chunk extends past its parent"),
            FormatErrorKind::ShortFmt => write!(f, "fmt chunk shorter than 14 bytes"),
            FormatErrorKind::UnsupportedEncoding(code) => {
                write!(f, "unsupported audio format 0x{:04X} (PCM required)", code)
            }
            FormatErrorKind::UnsupportedDepth(bits) => {
                write!(f, "unsupported bit depth {} (16 or 24 required)", bits)
            }
            FormatErrorKind::UnsupportedChannels(channels) => {
                write!(f, "unsupported channel count {} (1 or 2 required)", channels)
            }
            FormatErrorKind::UnsupportedSampleRate(rate) => {
                write!(f, "unsupported sample rate {} Hz", rate)
            }
        }
    }
}

/// Which side of an I/O operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoErrorKind {
    /// The stream ended before the requested bytes were read.
    UnexpectedEof,
    /// Any other read failure.
    ReadFailure,
    /// A write, seek or flush failed, or the stream did not advance as expected.
    WriteFailure,
}

impl fmt::Display for IoErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoErrorKind::UnexpectedEof => write!(f, "unexpected end of stream"),
            IoErrorKind::ReadFailure => write!(f, "read failed"),
            IoErrorKind::WriteFailure => write!(f, "write failed"),
        }
    }
}

/// Operations attempted in the wrong stream state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateErrorKind {
    /// The reader has not resolved both the `fmt ` and `data` chunks.
    NotPositioned,
    /// A header step was called out of order.
    OutOfOrder,
    /// A secondary channel was requested before any block was read.
    NoBlockRead,
    /// A read was requested after end-of-stream was reported.
    PastEnd,
    /// The writer has already been closed.
    Closed,
}

impl fmt::Display for StateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateErrorKind::NotPositioned => write!(f, "reader is not positioned on the data chunk"),
            StateErrorKind::OutOfOrder => write!(f, "header parsing steps called out of order"),
            StateErrorKind::NoBlockRead => write!(f, "no block has been read yet"),
            StateErrorKind::PastEnd => write!(f, "read past end of stream"),
            StateErrorKind::Closed => write!(f, "writer is closed"),
        }
    }
}

/// Errors raised by the WAV reader, writer and chunk scanner.
#[derive(Debug, Error)]
pub enum WavError {
    /// Malformed or unsupported container.
    #[error("malformed WAV container at byte offset {offset}: {kind}")]
    Format {
        /// What was wrong.
        kind: FormatErrorKind,
        /// Absolute stream offset where the problem was detected.
        offset: u64,
    },

    /// Underlying stream failure.
    #[error("{kind} at byte offset {offset}: {source}")]
    Io {
        /// Failure class.
        kind: IoErrorKind,
        /// Absolute stream offset of the failed operation.
        offset: u64,
        /// Original I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to open or create a file.
    #[error("failed to open '{}': {source}", .path.display())]
    Open {
        /// Path that could not be opened.
        path: PathBuf,
        /// Original I/O error.
        #[source]
        source: io::Error,
    },

    /// Operation not valid in the current state.
    #[error("invalid stream state: {0}")]
    State(StateErrorKind),

    /// Channel index outside the stream's channel count.
    #[error("channel {channel} out of range for {channels}-channel stream")]
    ChannelOutOfRange {
        /// Requested channel.
        channel: usize,
        /// Channels in the stream.
        channels: u16,
    },

    /// A block of zero frames was requested.
    #[error("block length must be greater than zero")]
    ZeroLengthBlock,

    /// A stereo stream was written without right-channel samples.
    #[error("stereo stream requires right channel data")]
    MissingChannelData,

    /// Left and right buffers differ in length.
    #[error("channel length mismatch: left has {left} samples, right has {right}")]
    ChannelLengthMismatch {
        /// Left buffer length.
        left: usize,
        /// Right buffer length.
        right: usize,
    },
}

impl WavError {
    /// Creates a format error at the given offset.
    pub fn format(kind: FormatErrorKind, offset: u64) -> Self {
        Self::Format { kind, offset }
    }

    /// Classifies a failed read as end-of-stream or a generic read failure.
    pub fn read(source: io::Error, offset: u64) -> Self {
        let kind = if source.kind() == io::ErrorKind::UnexpectedEof {
            IoErrorKind::UnexpectedEof
        } else {
            IoErrorKind::ReadFailure
        };
        Self::Io {
            kind,
            offset,
            source,
        }
    }

    /// Wraps a failed write, seek or flush.
    pub fn write(source: io::Error, offset: u64) -> Self {
        Self::Io {
            kind: IoErrorKind::WriteFailure,
            offset,
            source,
        }
    }

    /// Creates an open error for `path`.
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Returns the format error kind, if this is a format error.
    pub fn format_kind(&self) -> Option<FormatErrorKind> {
        match self {
            WavError::Format { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns the state error kind, if this is a state error.
    pub fn state_kind(&self) -> Option<StateErrorKind> {
        match self {
            WavError::State(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Returns the I/O error kind, if this is an I/O error.
    pub fn io_kind(&self) -> Option<IoErrorKind> {
        match self {
            WavError::Io { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            WavError::Format { .. } => "WAV_001",
            WavError::Io { .. } => "WAV_002",
            WavError::Open { .. } => "WAV_003",
            WavError::State(_) => "WAV_004",
            WavError::ChannelOutOfRange { .. } => "WAV_005",
            WavError::ZeroLengthBlock => "WAV_006",
            WavError::MissingChannelData => "WAV_007",
            WavError::ChannelLengthMismatch { .. } => "WAV_008",
        }
    }

    /// Broad error category.
    pub fn category(&self) -> &'static str {
        match self {
            WavError::Format { .. } => "format",
            WavError::Io { .. } | WavError::Open { .. } => "io",
            WavError::State(_) => "state",
            WavError::ChannelOutOfRange { .. } => "range",
            WavError::ZeroLengthBlock
            | WavError::MissingChannelData
            | WavError::ChannelLengthMismatch { .. } => "value",
        }
    }
}

/// Errors that can occur while processing audio.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Container error from the reader or writer.
    #[error(transparent)]
    Wav(#[from] WavError),

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// A frame did not have the length the processor expects.
    #[error("frame length mismatch: expected {expected}, found {found}")]
    FrameLength {
        /// Expected frame length.
        expected: usize,
        /// Actual frame length.
        found: usize,
    },

    /// The frame transform failed.
    #[error("transform error: {message}")]
    Transform {
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AudioError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a transform error.
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    /// Creates a frame length error.
    pub fn frame_length(expected: usize, found: usize) -> Self {
        Self::FrameLength { expected, found }
    }

    /// Returns the wrapped container error, if any.
    pub fn as_wav(&self) -> Option<&WavError> {
        match self {
            AudioError::Wav(err) => Some(err),
            _ => None,
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AudioError::Wav(err) => err.code(),
            AudioError::InvalidParameter { .. } => "AUDIO_001",
            AudioError::FrameLength { .. } => "AUDIO_002",
            AudioError::Transform { .. } => "AUDIO_003",
            AudioError::Io(_) => "AUDIO_004",
        }
    }

    /// Broad error category.
    pub fn category(&self) -> &'static str {
        match self {
            AudioError::Wav(err) => err.category(),
            _ => "audio",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_names_offset() {
        let err = WavError::format(FormatErrorKind::MissingFmt, 12);
        assert_eq!(
            err.to_string(),
            "malformed WAV container at byte offset 12: data chunk found before fmt chunk"
        );
        assert_eq!(err.format_kind(), Some(FormatErrorKind::MissingFmt));
        assert_eq!(err.code(), "WAV_001");
    }

    #[test]
    fn test_read_classifies_eof() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "short");
        assert_eq!(
            WavError::read(eof, 40).io_kind(),
            Some(IoErrorKind::UnexpectedEof)
        );

        let other = io::Error::new(io::ErrorKind::Other, "disk");
        assert_eq!(
            WavError::read(other, 40).io_kind(),
            Some(IoErrorKind::ReadFailure)
        );
    }

    #[test]
    fn test_unsupported_depth_message() {
        let err = WavError::format(FormatErrorKind::UnsupportedDepth(8), 34);
        assert!(err.to_string().contains("bit depth 8"));
    }

    #[test]
    fn test_audio_error_wraps_wav_code() {
        let err: AudioError = WavError::State(StateErrorKind::PastEnd).into();
        assert_eq!(err.code(), "WAV_004");
        assert_eq!(err.category(), "state");
        assert!(err.to_string().contains("past end"));
    }

    #[test]
    fn test_invalid_param_helper() {
        let err = AudioError::invalid_param("window_size", "must be even");
        assert!(err.to_string().contains("window_size"));
        assert!(err.to_string().contains("must be even"));
        assert_eq!(err.category(), "audio");
    }
}
