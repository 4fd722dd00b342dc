//! Overlap-add block processing.
//!
//! A continuous stream is cut into windows of `N` samples advancing by
//! `N / 2`. Each window goes through a [`FrameTransform`](crate::transform::FrameTransform),
//! is multiplied by a Hann window, and is summed with the tail of the
//! previous window. Output lags input by one hop.

mod processor;
mod window;

pub use processor::OverlapAddProcessor;
pub use window::{HannWindow, WindowKind};
