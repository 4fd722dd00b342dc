//! Frame transforms.
//!
//! A [`FrameTransform`] maps one fixed-size input frame to an output frame of
//! the same size. The overlap-add processor treats it as opaque; it may keep
//! state between calls.

pub mod eq;
pub mod filter;

use crate::error::{AudioError, AudioResult};

pub use eq::{EqBand, EqBandType, SpectralEq};

/// A frame-based audio transform.
pub trait FrameTransform {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Required frame length, or `None` if any length is accepted.
    fn frame_len(&self) -> Option<usize> {
        None
    }

    /// Transforms `input` into `output`. Both slices have the same length.
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> AudioResult<()>;
}

/// Passes frames through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl FrameTransform for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) -> AudioResult<()> {
        check_lengths(input, output)?;
        output.copy_from_slice(input);
        Ok(())
    }
}

/// Multiplies every sample by a constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    linear: f32,
}

impl Gain {
    /// Creates a gain from a linear factor.
    pub fn new(linear: f32) -> Self {
        Self { linear }
    }

    /// Creates a gain from decibels.
    pub fn from_db(db: f32) -> Self {
        Self::new(10.0_f32.powf(db / 20.0))
    }

    /// Maps a normalized parameter in [0, 1] onto `min_db..=max_db`.
    ///
    /// The parameter is clamped before mapping.
    pub fn from_param(param: f32, min_db: f32, max_db: f32) -> Self {
        let t = param.clamp(0.0, 1.0);
        Self::from_db(min_db + (max_db - min_db) * t)
    }

    /// Linear factor.
    pub fn linear(&self) -> f32 {
        self.linear
    }
}

impl FrameTransform for Gain {
    fn name(&self) -> &str {
        "gain"
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) -> AudioResult<()> {
        check_lengths(input, output)?;
        for (out, &sample) in output.iter_mut().zip(input) {
            *out = sample * self.linear;
        }
        Ok(())
    }
}

/// Adapts a closure into a transform.
pub struct FnTransform<F> {
    name: String,
    func: F,
}

impl<F> FnTransform<F>
where
    F: FnMut(&[f32], &mut [f32]),
{
    /// Wraps `func` under the given name.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> FrameTransform for FnTransform<F>
where
    F: FnMut(&[f32], &mut [f32]),
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) -> AudioResult<()> {
        check_lengths(input, output)?;
        (self.func)(input, output);
        Ok(())
    }
}

/// Runs several transforms in sequence.
#[derive(Default)]
pub struct TransformChain {
    stages: Vec<Box<dyn FrameTransform>>,
    scratch: Vec<f32>,
    name: String,
}

impl TransformChain {
    /// Creates an empty chain, which behaves like [`Identity`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    pub fn push(&mut self, stage: Box<dyn FrameTransform>) {
        if !self.name.is_empty() {
            self.name.push('+');
        }
        self.name.push_str(stage.name());
        self.stages.push(stage);
    }

    /// Appends a stage, builder style.
    pub fn with(mut self, stage: Box<dyn FrameTransform>) -> Self {
        self.push(stage);
        self
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl FrameTransform for TransformChain {
    fn name(&self) -> &str {
        if self.name.is_empty() {
            "identity"
        } else {
            &self.name
        }
    }

    fn frame_len(&self) -> Option<usize> {
        self.stages.iter().find_map(|s| s.frame_len())
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) -> AudioResult<()> {
        check_lengths(input, output)?;
        output.copy_from_slice(input);
        self.scratch.resize(input.len(), 0.0);
        for stage in &mut self.stages {
            self.scratch.copy_from_slice(output);
            stage.process(&self.scratch, output)?;
        }
        Ok(())
    }
}

fn check_lengths(input: &[f32], output: &[f32]) -> AudioResult<()> {
    if input.len() != output.len() {
        return Err(AudioError::frame_length(input.len(), output.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_copies() {
        let input = [0.1, -0.2, 0.3];
        let mut output = [0.0; 3];
        Identity.process(&input, &mut output).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_length_mismatch() {
        let mut output = [0.0; 2];
        let err = Identity.process(&[0.0; 3], &mut output).unwrap_err();
        assert!(matches!(
            err,
            AudioError::FrameLength {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_gain_from_param() {
        let quiet = Gain::from_param(0.0, -12.0, 0.0);
        let loud = Gain::from_param(1.0, -12.0, 0.0);
        let clamped = Gain::from_param(4.0, -12.0, 0.0);
        assert!((loud.linear() - 1.0).abs() < 1e-6);
        assert!((quiet.linear() - 0.251_188_64).abs() < 1e-5);
        assert_eq!(clamped, loud);
    }

    #[test]
    fn test_gain_scales() {
        let mut gain = Gain::new(0.5);
        let mut output = [0.0; 2];
        gain.process(&[1.0, -0.5], &mut output).unwrap();
        assert_eq!(output, [0.5, -0.25]);
    }

    #[test]
    fn test_chain_runs_in_order() {
        let mut chain = TransformChain::new()
            .with(Box::new(Gain::new(2.0)))
            .with(Box::new(FnTransform::new("offset", |i: &[f32], o: &mut [f32]| {
                for (o, i) in o.iter_mut().zip(i) {
                    *o = i + 1.0;
                }
            })));
        let mut output = [0.0; 2];
        chain.process(&[0.25, 0.5], &mut output).unwrap();
        assert_eq!(output, [1.5, 2.0]);
        assert_eq!(chain.name(), "gain+offset");
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut chain = TransformChain::new();
        let mut output = [0.0; 2];
        chain.process(&[0.3, 0.4], &mut output).unwrap();
        assert_eq!(output, [0.3, 0.4]);
        assert_eq!(chain.name(), "identity");
    }
}
