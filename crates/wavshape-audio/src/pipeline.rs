//! File-to-file block processing.
//!
//! [`run`] drives a reader through one [`OverlapAddProcessor`] per channel
//! into a writer. The processors delay output by one hop; the first window
//! therefore writes only its second half, which keeps output sample `i`
//! aligned with input sample `i`.

use std::io::{Read, Seek, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AudioError, AudioResult, StateErrorKind, WavError};
use crate::ola::{OverlapAddProcessor, WindowKind};
use crate::stats::MovingAverage;
use crate::transform::FrameTransform;
use crate::wav::{FormatDescriptor, SampleDepth, WavStreamReader, WavStreamWriter};

/// Default analysis window length.
pub const DEFAULT_WINDOW_SIZE: usize = 1024;

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Samples per analysis window; must be even.
    pub window_size: usize,
    /// Hann window variant.
    pub window: WindowKind,
    /// After the input ends, feed one window of silence so the final hop is
    /// flushed and the output matches the input length.
    pub drain_tail: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            window: WindowKind::default(),
            drain_tail: true,
        }
    }
}

/// Progress of one processed window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockReport {
    /// Zero-based window index.
    pub index: u64,
    /// Frames written per channel so far.
    pub frames_written: u64,
    /// Frames per channel in the input.
    pub total_frames: u64,
    /// Time spent in the transform for this window, all channels included.
    pub latency: Duration,
}

impl BlockReport {
    /// Completion in percent, capped at 100.
    pub fn completion(&self) -> f64 {
        if self.total_frames == 0 {
            return 100.0;
        }
        (self.frames_written as f64 / self.total_frames as f64 * 100.0).min(100.0)
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    /// Windows processed, including a drain window.
    pub blocks: u64,
    /// Frames written per channel.
    pub frames_written: u64,
    /// Frames per channel in the input.
    pub total_frames: u64,
    /// Mean transform latency per window in milliseconds.
    pub mean_latency_ms: f64,
    /// Worst transform latency per window in milliseconds.
    pub max_latency_ms: f64,
    /// Sample standard deviation of window latency, with two or more windows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_std_ms: Option<f64>,
    /// True if the input ended before every frame was written.
    pub stopped_early: bool,
}

/// Receives progress from [`run`].
pub trait ProgressObserver {
    /// Called after each window is written.
    fn on_block(&mut self, report: &BlockReport);

    /// Called once after the last window.
    fn on_finish(&mut self, _summary: &PipelineSummary) {}
}

/// Observer that ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_block(&mut self, _report: &BlockReport) {}
}

/// Streams every frame of `reader` through `transform` into `writer`.
///
/// The reader must be positioned on its data chunk and the writer must have
/// the same channel count. Channels share the transform and are processed in
/// order for each window. The writer is not closed.
pub fn run<R, W>(
    reader: &mut WavStreamReader<R>,
    writer: &mut WavStreamWriter<W>,
    transform: &mut dyn FrameTransform,
    config: &PipelineConfig,
    observer: &mut dyn ProgressObserver,
) -> AudioResult<PipelineSummary>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let n = config.window_size;
    let format = *reader
        .format()
        .ok_or(WavError::State(StateErrorKind::NotPositioned))?;
    if writer.format().channels != format.channels {
        return Err(AudioError::invalid_param(
            "channels",
            format!(
                "writer has {} channels, reader has {}",
                writer.format().channels,
                format.channels
            ),
        ));
    }
    if let Some(len) = transform.frame_len() {
        if len != n {
            return Err(AudioError::frame_length(n, len));
        }
    }

    let channels = usize::from(format.channels);
    let mut processors = (0..channels)
        .map(|_| OverlapAddProcessor::new(n, config.window))
        .collect::<AudioResult<Vec<_>>>()?;
    let hop = n / 2;
    let total = reader.frames_per_channel();

    let mut outputs = vec![vec![0.0f32; n]; channels];
    let silence = vec![0.0f32; n];
    let expected_blocks = (total / n as u64) as usize + 2;
    let mut latency = MovingAverage::new(expected_blocks, 0.1);

    info!(
        transform = transform.name(),
        window = n,
        channels,
        total_frames = total,
        "starting pipeline"
    );

    let mut written = 0u64;
    let mut blocks = 0u64;
    let mut drained = false;
    let mut stopped_early = false;

    while written < total {
        let elapsed = if reader.is_exhausted() {
            if !config.drain_tail || drained {
                stopped_early = true;
                break;
            }
            drained = true;
            let started = Instant::now();
            for (processor, out) in processors.iter_mut().zip(outputs.iter_mut()) {
                processor.process_window(&silence, transform, out)?;
            }
            started.elapsed()
        } else {
            let block = reader.read_block(n)?;
            let started = Instant::now();
            for (ch, (processor, out)) in processors.iter_mut().zip(outputs.iter_mut()).enumerate() {
                processor.process_window(block.channel(ch), transform, out)?;
            }
            started.elapsed()
        };
        latency.push(elapsed.as_secs_f64() * 1000.0);

        // the first window's first half is start-up transient
        let skip = if blocks == 0 { hop } else { 0 };
        let take = ((n - skip) as u64).min(total - written) as usize;
        let range = skip..skip + take;
        writer.write_block(
            &outputs[0][range.clone()],
            outputs.get(1).map(|right| &right[range.clone()]),
        )?;
        written += take as u64;

        let report = BlockReport {
            index: blocks,
            frames_written: written,
            total_frames: total,
            latency: elapsed,
        };
        debug!(
            block = blocks,
            written,
            completion = report.completion(),
            "processed window"
        );
        observer.on_block(&report);
        blocks += 1;
    }

    let summary = PipelineSummary {
        blocks,
        frames_written: written,
        total_frames: total,
        mean_latency_ms: latency.mean().unwrap_or(0.0),
        max_latency_ms: latency.max().unwrap_or(0.0),
        latency_std_ms: latency.std_dev(),
        stopped_early,
    };
    info!(
        blocks,
        frames_written = written,
        stopped_early,
        mean_latency_ms = summary.mean_latency_ms,
        "pipeline finished"
    );
    observer.on_finish(&summary);
    Ok(summary)
}

/// Processes `input` into a new file at `output`.
///
/// The output keeps the input's channels and sample rate; its depth is
/// `output_depth` or the input's. The input format is validated before the
/// output file is created.
pub fn process_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    transform: &mut dyn FrameTransform,
    config: &PipelineConfig,
    output_depth: Option<SampleDepth>,
    observer: &mut dyn ProgressObserver,
) -> AudioResult<PipelineSummary> {
    let mut reader = WavStreamReader::open_path(input.as_ref())?;
    let format = *reader
        .format()
        .ok_or(WavError::State(StateErrorKind::NotPositioned))?;
    let input_depth = format.validate_stream(reader.data_offset())?;
    let depth = output_depth.unwrap_or(input_depth);

    let out_format = FormatDescriptor::pcm(format.channels, format.sample_rate, depth);
    let mut writer = WavStreamWriter::create(output.as_ref(), out_format)?;
    let summary = run(&mut reader, &mut writer, transform, config, observer)?;
    writer.close()?;
    Ok(summary)
}
