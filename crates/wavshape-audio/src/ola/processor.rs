//! Overlap-add processor.

use super::window::{HannWindow, WindowKind};
use crate::error::{AudioError, AudioResult};
use crate::transform::FrameTransform;

/// Per-channel overlap-add state.
///
/// `history` always holds the most recent `window_size` input samples and
/// `overlap` the windowed second half of the previous transform output. All
/// buffers are sized at construction and never reallocated.
#[derive(Debug, Clone)]
pub struct OverlapAddProcessor {
    window: HannWindow,
    hop_size: usize,
    history: Vec<f32>,
    overlap: Vec<f32>,
    frame: Vec<f32>,
}

impl OverlapAddProcessor {
    /// Creates a processor for windows of `window_size` samples.
    ///
    /// `window_size` must be even and at least 2.
    pub fn new(window_size: usize, kind: WindowKind) -> AudioResult<Self> {
        if window_size < 2 || window_size % 2 != 0 {
            return Err(AudioError::invalid_param(
                "window_size",
                format!("must be even and at least 2, got {}", window_size),
            ));
        }
        let hop_size = window_size / 2;
        Ok(Self {
            window: HannWindow::new(window_size, kind),
            hop_size,
            history: vec![0.0; window_size],
            overlap: vec![0.0; hop_size],
            frame: vec![0.0; window_size],
        })
    }

    /// Window length.
    pub fn window_size(&self) -> usize {
        self.history.len()
    }

    /// Hop length, half the window.
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// The analysis window.
    pub fn window(&self) -> &HannWindow {
        &self.window
    }

    /// Pushes one hop of input and produces one hop of finished output.
    ///
    /// The output hop corresponds to the input hop before `hop`; the first
    /// call after construction or [`reset`](Self::reset) yields only the
    /// start-up transient.
    pub fn process_hop(
        &mut self,
        hop: &[f32],
        transform: &mut dyn FrameTransform,
        out: &mut [f32],
    ) -> AudioResult<()> {
        let h = self.hop_size;
        if hop.len() != h {
            return Err(AudioError::frame_length(h, hop.len()));
        }
        if out.len() != h {
            return Err(AudioError::frame_length(h, out.len()));
        }

        self.history.copy_within(h.., 0);
        self.history[h..].copy_from_slice(hop);

        transform.process(&self.history, &mut self.frame)?;
        self.window.apply(&mut self.frame);

        for ((o, &prev), &cur) in out.iter_mut().zip(&self.overlap).zip(&self.frame[..h]) {
            *o = prev + cur;
        }
        self.overlap.copy_from_slice(&self.frame[h..]);
        Ok(())
    }

    /// Processes a full window as two consecutive hops.
    pub fn process_window(
        &mut self,
        block: &[f32],
        transform: &mut dyn FrameTransform,
        out: &mut [f32],
    ) -> AudioResult<()> {
        let n = self.window_size();
        if block.len() != n {
            return Err(AudioError::frame_length(n, block.len()));
        }
        if out.len() != n {
            return Err(AudioError::frame_length(n, out.len()));
        }

        let (first_in, second_in) = block.split_at(self.hop_size);
        let (first_out, second_out) = out.split_at_mut(self.hop_size);
        self.process_hop(first_in, transform, first_out)?;
        self.process_hop(second_in, transform, second_out)
    }

    /// Clears history and overlap.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.overlap.fill(0.0);
        self.frame.fill(0.0);
    }
}
