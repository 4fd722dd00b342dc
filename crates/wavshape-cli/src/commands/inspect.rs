//! Inspect command implementation
//!
//! Prints the chunk layout and `fmt ` details of a WAV file, optionally with
//! a BLAKE3 hash of its PCM payload.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use wavshape_audio::WavStreamReader;

use super::json_output::{error_codes, InspectOutput, InspectResult, JsonError};

/// Frames read per hashing step.
const HASH_BLOCK_FRAMES: usize = 4096;

/// Run the inspect command
///
/// # Returns
/// Exit code: 0 if the file parsed, 1 otherwise
pub fn run(input: &Path, hash: bool, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(input, hash)
    } else {
        run_human(input, hash)
    }
}

/// Run inspect with human-readable (colored) output
fn run_human(input: &Path, hash: bool) -> Result<ExitCode> {
    println!("{} {}", "Inspecting:".cyan().bold(), input.display());

    let result = inspect(input, hash)?;

    println!("\n{}", "Chunks:".bold());
    for chunk in &result.chunks {
        println!(
            "  {:>8}  {}  {} bytes",
            chunk.offset,
            format!("'{}'", chunk.id).yellow(),
            chunk.size
        );
    }

    let format = &result.format;
    println!("\n{}", "Format:".bold());
    println!("  {} {}", "Encoding:".dimmed(), encoding_label(format.audio_format));
    println!("  {} {}", "Channels:".dimmed(), format.channels);
    println!("  {} {} Hz", "Sample rate:".dimmed(), format.sample_rate);
    println!("  {} {}", "Bits per sample:".dimmed(), format.bits_per_sample);
    println!("  {} {}", "Block align:".dimmed(), format.block_align);

    println!("\n{}", "Data:".bold());
    println!("  {} {}", "Offset:".dimmed(), result.data_offset);
    println!("  {} {} bytes", "Size:".dimmed(), result.data_size);
    println!("  {} {}", "Frames:".dimmed(), result.frames_per_channel);
    println!("  {} {:.3} s", "Duration:".dimmed(), result.duration_seconds);
    if let Some(hash) = &result.pcm_hash {
        println!("  {} {}", "BLAKE3:".dimmed(), hash);
    }

    println!();
    if result.supported {
        println!("{} format can be processed", "OK".green().bold());
    } else {
        println!(
            "{} format cannot be processed (16/24-bit PCM, mono or stereo only)",
            "UNSUPPORTED".yellow().bold()
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Run inspect with machine-readable JSON output
fn run_json(input: &Path, hash: bool) -> Result<ExitCode> {
    let input_str = input.display().to_string();

    let (output, code) = match inspect(input, hash) {
        Ok(result) => (
            InspectOutput {
                success: true,
                errors: Vec::new(),
                input: input_str,
                result: Some(result),
            },
            ExitCode::SUCCESS,
        ),
        Err(e) => {
            let error =
                JsonError::from_anyhow(&e, error_codes::PROCESSING).with_file(input_str.clone());
            (
                InspectOutput {
                    success: false,
                    errors: vec![error],
                    input: input_str,
                    result: None,
                },
                ExitCode::from(1),
            )
        }
    };

    let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(code)
}

/// Reads the header of `input` and, if `hash` is set, its whole payload.
pub fn inspect(input: &Path, hash: bool) -> Result<InspectResult> {
    let mut reader = WavStreamReader::open_path(input)
        .with_context(|| format!("Failed to open WAV file: {}", input.display()))?;
    let format = reader
        .format()
        .copied()
        .context("WAV file has no fmt chunk")?;

    let frames_per_channel = reader.frames_per_channel();
    let supported = format.validate_stream(reader.data_offset()).is_ok();

    let pcm_hash = if hash {
        let mut hasher = blake3::Hasher::new();
        loop {
            hasher.update(reader.read_raw(HASH_BLOCK_FRAMES)?);
            if reader.is_exhausted() {
                break;
            }
        }
        Some(hasher.finalize().to_hex().to_string())
    } else {
        None
    };

    Ok(InspectResult {
        chunks: reader.chunks().to_vec(),
        format,
        data_offset: reader.data_offset(),
        data_size: reader.data_size().unwrap_or(0),
        frames_per_channel,
        duration_seconds: format.duration_seconds(frames_per_channel),
        supported,
        pcm_hash,
    })
}

fn encoding_label(tag: u16) -> String {
    match tag {
        wavshape_audio::wav::WAVE_FORMAT_PCM => "PCM".to_string(),
        wavshape_audio::wav::WAVE_FORMAT_EXTENSIBLE => "Extensible".to_string(),
        other => format!("0x{:04X}", other),
    }
}
