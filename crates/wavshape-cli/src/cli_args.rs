//! CLI argument definitions for the wavshape command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wavshape_audio::WindowKind;

/// wavshape - block-wise WAV processing
#[derive(Parser, Debug)]
#[command(name = "wavshape")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a WAV file through a model and write the result
    Process {
        /// Input WAV file (16/24-bit PCM, mono or stereo)
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        /// Model descriptor (JSON file, or a directory containing model.json)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// EQ configuration (JSON) applied after the model
        #[arg(long)]
        eq: Option<PathBuf>,

        /// Model parameter, clamped to [0, 1] (0.0 when omitted)
        #[arg(long, allow_negative_numbers = true)]
        pf: Option<f32>,

        /// Hann window variant (overrides the model)
        #[arg(long, value_enum)]
        window: Option<WindowArg>,

        /// Analysis window length in samples, must be even (overrides the model)
        #[arg(long)]
        frame_length: Option<usize>,

        /// Output bit depth (16 or 24; default: same as input)
        #[arg(long)]
        bits: Option<u16>,

        /// Stop when the input ends instead of flushing the last hop
        #[arg(long)]
        no_drain: bool,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Show the chunk layout and format of a WAV file
    Inspect {
        /// WAV file to inspect
        input: PathBuf,

        /// Compute a BLAKE3 hash of the PCM payload
        #[arg(long)]
        hash: bool,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

/// Hann window variant.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowArg {
    /// Zero at both ends (N - 1 denominator)
    Symmetric,
    /// Sums to exactly one at 50% overlap (N denominator)
    Periodic,
}

impl From<WindowArg> for WindowKind {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Symmetric => WindowKind::Symmetric,
            WindowArg::Periodic => WindowKind::Periodic,
        }
    }
}
