//! Process command implementation
//!
//! Runs a WAV file through the configured model (and optional EQ) with
//! overlap-add block processing and writes the result.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use tracing::{info, warn};
use wavshape_audio::pipeline::{
    self, BlockReport, NoProgress, PipelineConfig, PipelineSummary, ProgressObserver,
};
use wavshape_audio::transform::{FrameTransform, SpectralEq, TransformChain};
use wavshape_audio::{FormatDescriptor, SampleDepth, WavStreamReader, WindowKind};

use super::json_output::{error_codes, JsonError, ProcessOutput};
use crate::config::{clamp_param, EqConfig, ModelConfig};

/// Options for one `process` run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Input WAV file.
    pub input: PathBuf,
    /// Output WAV file.
    pub output: PathBuf,
    /// Model descriptor file or directory.
    pub model: Option<PathBuf>,
    /// EQ configuration file.
    pub eq: Option<PathBuf>,
    /// Raw model parameter, clamped before use.
    pub param: Option<f32>,
    /// Window variant override.
    pub window: Option<WindowKind>,
    /// Window length override.
    pub frame_length: Option<usize>,
    /// Output bit depth override.
    pub bits: Option<u16>,
    /// Feed one window of silence after the input ends.
    pub drain_tail: bool,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    /// Model name.
    pub model: String,
    /// Transform chain name.
    pub transform: String,
    /// Input format.
    pub input_format: FormatDescriptor,
    /// Effective pipeline settings.
    pub config: PipelineConfig,
    /// Pipeline summary.
    pub summary: PipelineSummary,
}

/// Run the process command
///
/// # Returns
/// Exit code: 0 on success, 1 on failure
pub fn run(options: &ProcessOptions, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(options)
    } else {
        run_human(options)
    }
}

/// Run process with human-readable (colored) output
fn run_human(options: &ProcessOptions) -> Result<ExitCode> {
    println!(
        "{} {} -> {}",
        "Processing:".cyan().bold(),
        options.input.display(),
        options.output.display()
    );
    let format = read_format(&options.input)?;
    println!(
        "  {} {} ch, {} Hz, {}-bit",
        "Input:".dimmed(),
        format.channels,
        format.sample_rate,
        format.bits_per_sample
    );

    let mut progress = ConsoleProgress;
    let report = execute(options, &mut progress)?;

    let summary = &report.summary;
    if summary.stopped_early {
        println!(
            "{} input ended after {} of {} frames",
            "!".yellow(),
            summary.frames_written,
            summary.total_frames
        );
    }
    println!(
        "{} 100 % / Average block time: {:.2} ms",
        "Completion:".green().bold(),
        summary.mean_latency_ms
    );
    println!(
        "{} {} ({} blocks, {} frames)",
        "Wrote:".dimmed(),
        options.output.display(),
        summary.blocks,
        summary.frames_written
    );
    Ok(ExitCode::SUCCESS)
}

/// Run process with machine-readable JSON output
fn run_json(options: &ProcessOptions) -> Result<ExitCode> {
    let input = options.input.display().to_string();
    let output_path = options.output.display().to_string();

    let (output, code) = match execute(options, &mut NoProgress) {
        Ok(report) => (
            ProcessOutput {
                success: true,
                errors: Vec::new(),
                input,
                output: output_path,
                model: Some(report.model),
                transform: Some(report.transform),
                input_format: Some(report.input_format),
                summary: Some(report.summary),
            },
            ExitCode::SUCCESS,
        ),
        Err(e) => {
            let error =
                JsonError::from_anyhow(&e, error_codes::PROCESSING).with_file(input.clone());
            (
                ProcessOutput::failure(&input, &output_path, vec![error]),
                ExitCode::from(1),
            )
        }
    };

    let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(code)
}

/// Loads configuration, builds the transform chain and runs the pipeline.
pub fn execute(
    options: &ProcessOptions,
    observer: &mut dyn ProgressObserver,
) -> Result<ProcessReport> {
    let input_format = read_format(&options.input)?;

    let model = match &options.model {
        Some(path) => ModelConfig::load(path)?,
        None => ModelConfig::default(),
    };

    let param = options.param.map(clamp_param);
    if let Some(raw) = options.param {
        if model.param_count() == 0 {
            warn!(model = %model.name, "model has no parameters; ignoring --pf {}", raw);
        } else if param != Some(raw) {
            info!("--pf {} clamped to {:?}", raw, param);
        }
    }

    let config = PipelineConfig {
        window_size: options.frame_length.unwrap_or(model.frame_length),
        window: options.window.unwrap_or(model.window),
        drain_tail: options.drain_tail,
    };
    if config.window_size < 2 || config.window_size % 2 != 0 {
        return Err(anyhow!(
            "frame length must be even and at least 2, got {}",
            config.window_size
        ));
    }

    let output_depth = options
        .bits
        .map(|bits| {
            SampleDepth::from_bits(bits)
                .ok_or_else(|| anyhow!("unsupported output bit depth {} (16 or 24)", bits))
        })
        .transpose()?;

    let mut chain = build_chain(&model, options.eq.as_deref(), &input_format, &config, param)?;
    let transform = chain.name().to_string();

    info!(
        model = %model.name,
        transform = %transform,
        window = config.window_size,
        kind = config.window.as_str(),
        "configured pipeline"
    );

    let summary = pipeline::process_file(
        &options.input,
        &options.output,
        &mut chain,
        &config,
        output_depth,
        observer,
    )
    .with_context(|| {
        format!(
            "Failed to process {} into {}",
            options.input.display(),
            options.output.display()
        )
    })?;

    Ok(ProcessReport {
        model: model.name,
        transform,
        input_format,
        config,
        summary,
    })
}

fn read_format(path: &Path) -> Result<FormatDescriptor> {
    let reader = WavStreamReader::open_path(path)
        .with_context(|| format!("Failed to open input: {}", path.display()))?;
    let format = reader
        .format()
        .copied()
        .context("input has no fmt chunk")?;
    format
        .validate_stream(reader.data_offset())
        .with_context(|| format!("Unsupported input: {}", path.display()))?;
    Ok(format)
}

fn build_chain(
    model: &ModelConfig,
    eq_path: Option<&Path>,
    format: &FormatDescriptor,
    config: &PipelineConfig,
    param: Option<f32>,
) -> Result<TransformChain> {
    let mut chain = TransformChain::new();
    chain.push(model.build(format.sample_rate, config.window_size, param)?);

    if let Some(path) = eq_path {
        let eq = EqConfig::load(path)?;
        let stage: Box<dyn FrameTransform> = Box::new(
            SpectralEq::new(&eq.bands, format.sample_rate, config.window_size)
                .context("Failed to build EQ stage")?,
        );
        chain.push(stage);
    }
    Ok(chain)
}

/// Prints one line per processed block.
struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_block(&mut self, report: &BlockReport) {
        println!(
            "  {} {:.1} % / {:.2} ms",
            "Block completion / timing:".dimmed(),
            report.completion(),
            report.latency.as_secs_f64() * 1000.0
        );
    }
}
