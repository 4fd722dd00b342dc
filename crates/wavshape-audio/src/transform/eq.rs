//! Frequency-domain parametric EQ.
//!
//! Each frame is transformed with an FFT, every bin is scaled by the combined
//! magnitude response of the configured bands, and the result is transformed
//! back. The gain curve is real and symmetric, so the stage adds no phase
//! shift and its output stays aligned with the overlap-add grid.

use std::fmt;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use super::filter::BiquadCoeffs;
use super::FrameTransform;
use crate::error::{AudioError, AudioResult};

/// Lowest band frequency in Hz.
const MIN_BAND_HZ: f64 = 20.0;

/// Highest band frequency as a fraction of the sample rate.
const MAX_BAND_RATIO: f64 = 0.45;

/// Type of EQ band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqBandType {
    /// Low shelf: boost/cut frequencies below the frequency.
    Lowshelf,
    /// High shelf: boost/cut frequencies above the frequency.
    Highshelf,
    /// Peak (bell curve): boost/cut frequencies around the frequency.
    Peak,
    /// Notch: cut at the frequency (zero gain at center).
    Notch,
    /// Lowpass: remove content above the frequency.
    Lowpass,
    /// Highpass: remove content below the frequency.
    Highpass,
}

fn default_q() -> f64 {
    std::f64::consts::FRAC_1_SQRT_2
}

/// One EQ band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqBand {
    /// Center, corner or shelf frequency in Hz.
    pub frequency: f64,
    /// Gain in dB; ignored by notch, lowpass and highpass bands.
    #[serde(default)]
    pub gain_db: f64,
    /// Q factor.
    #[serde(default = "default_q")]
    pub q: f64,
    /// Band shape.
    pub band_type: EqBandType,
}

impl EqBand {
    /// Computes biquad coefficients with parameters clamped to safe ranges.
    pub fn coefficients(&self, sample_rate: f64) -> BiquadCoeffs {
        let upper = (sample_rate * MAX_BAND_RATIO).max(MIN_BAND_HZ);
        let frequency = self.frequency.clamp(MIN_BAND_HZ, upper);
        let q = self.q.clamp(0.1, 10.0);
        let gain_db = self.gain_db.clamp(-24.0, 24.0);

        match self.band_type {
            EqBandType::Lowshelf => BiquadCoeffs::low_shelf(frequency, gain_db, sample_rate),
            EqBandType::Highshelf => BiquadCoeffs::high_shelf(frequency, gain_db, sample_rate),
            EqBandType::Peak => BiquadCoeffs::peaking_eq(frequency, q, gain_db, sample_rate),
            EqBandType::Notch => BiquadCoeffs::notch(frequency, q, sample_rate),
            EqBandType::Lowpass => BiquadCoeffs::lowpass(frequency, q, sample_rate),
            EqBandType::Highpass => BiquadCoeffs::highpass(frequency, q, sample_rate),
        }
    }
}

/// Zero-phase spectral EQ over fixed-size frames.
pub struct SpectralEq {
    frame_len: usize,
    gains: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl fmt::Debug for SpectralEq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralEq")
            .field("frame_len", &self.frame_len)
            .finish_non_exhaustive()
    }
}

impl SpectralEq {
    /// Plans the FFTs and precomputes the per-bin gain curve.
    pub fn new(bands: &[EqBand], sample_rate: u32, frame_len: usize) -> AudioResult<Self> {
        if frame_len < 2 {
            return Err(AudioError::invalid_param(
                "frame_len",
                format!("must be at least 2, got {}", frame_len),
            ));
        }
        if sample_rate == 0 {
            return Err(AudioError::invalid_param("sample_rate", "must be positive"));
        }

        let sr = f64::from(sample_rate);
        if !bands.is_empty() && sr * MAX_BAND_RATIO < MIN_BAND_HZ {
            return Err(AudioError::invalid_param(
                "sample_rate",
                format!(
                    "{} Hz is too low for EQ bands (band range starts at {} Hz)",
                    sample_rate, MIN_BAND_HZ
                ),
            ));
        }
        let coeffs: Vec<BiquadCoeffs> = bands.iter().map(|b| b.coefficients(sr)).collect();
        let gains = (0..frame_len)
            .map(|k| {
                // bins above Nyquist mirror the ones below
                let bin = k.min(frame_len - k);
                let freq = bin as f64 * sr / frame_len as f64;
                coeffs
                    .iter()
                    .map(|c| c.magnitude_at(freq, sr))
                    .product::<f64>() as f32
            })
            .collect();

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(frame_len);
        let inverse = planner.plan_fft_inverse(frame_len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Ok(Self {
            frame_len,
            gains,
            forward,
            inverse,
            spectrum: vec![Complex::new(0.0, 0.0); frame_len],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        })
    }

    /// Gain applied to each FFT bin.
    pub fn gains(&self) -> &[f32] {
        &self.gains
    }
}

impl FrameTransform for SpectralEq {
    fn name(&self) -> &str {
        "eq"
    }

    fn frame_len(&self) -> Option<usize> {
        Some(self.frame_len)
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) -> AudioResult<()> {
        if input.len() != self.frame_len {
            return Err(AudioError::frame_length(self.frame_len, input.len()));
        }
        if output.len() != self.frame_len {
            return Err(AudioError::frame_length(self.frame_len, output.len()));
        }

        for (bin, &sample) in self.spectrum.iter_mut().zip(input) {
            *bin = Complex::new(sample, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);
        for (bin, &gain) in self.spectrum.iter_mut().zip(&self.gains) {
            *bin *= gain;
        }
        self.inverse
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let scale = 1.0 / self.frame_len as f32;
        for (out, bin) in output.iter_mut().zip(&self.spectrum) {
            *out = bin.re * scale;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SR: u32 = 44100;
    const N: usize = 1024;

    fn bin_sine(bin: usize) -> Vec<f32> {
        (0..N)
            .map(|i| (2.0 * PI * bin as f32 * i as f32 / N as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_no_bands_is_transparent() {
        let mut eq = SpectralEq::new(&[], SR, N).unwrap();
        let input = bin_sine(10);
        let mut output = vec![0.0; N];
        eq.process(&input, &mut output).unwrap();
        for (a, b) in input.iter().zip(&output) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_peak_boosts_center_bin() {
        let bin = 48;
        let freq = bin as f64 * SR as f64 / N as f64;
        let bands = [EqBand {
            frequency: freq,
            gain_db: 6.0,
            q: 1.0,
            band_type: EqBandType::Peak,
        }];
        let mut eq = SpectralEq::new(&bands, SR, N).unwrap();
        let expected_gain = eq.gains()[bin];
        assert!((expected_gain - 1.995).abs() < 0.01);

        let input = bin_sine(bin);
        let mut output = vec![0.0; N];
        eq.process(&input, &mut output).unwrap();
        for (a, b) in input.iter().zip(&output) {
            assert!((a * expected_gain - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_highpass_removes_dc() {
        let bands = [EqBand {
            frequency: 200.0,
            gain_db: 0.0,
            q: 0.707,
            band_type: EqBandType::Highpass,
        }];
        let mut eq = SpectralEq::new(&bands, SR, N).unwrap();
        let mut output = vec![1.0; N];
        eq.process(&vec![0.5; N], &mut output).unwrap();
        assert!(output.iter().all(|s| s.abs() < 1e-5));
    }

    #[test]
    fn test_rejects_wrong_frame_length() {
        let mut eq = SpectralEq::new(&[], SR, N).unwrap();
        let mut output = vec![0.0; 16];
        let err = eq.process(&[0.0; 16], &mut output).unwrap_err();
        assert!(matches!(
            err,
            AudioError::FrameLength {
                expected: N,
                found: 16
            }
        ));
    }

    #[test]
    fn test_low_sample_rate_is_rejected() {
        let bands = [EqBand {
            frequency: 1000.0,
            gain_db: 3.0,
            q: 1.0,
            band_type: EqBandType::Peak,
        }];
        let err = SpectralEq::new(&bands, 40, 64).unwrap_err();
        assert_eq!(err.code(), "AUDIO_001");
        assert!(err.to_string().contains("40 Hz"));

        // a flat curve needs no band range
        assert!(SpectralEq::new(&[], 40, 64).is_ok());
        assert!(SpectralEq::new(&bands, 45, 64).is_ok());
    }

    #[test]
    fn test_coefficients_tolerate_tiny_sample_rate() {
        let band = EqBand {
            frequency: 1000.0,
            gain_db: 3.0,
            q: 1.0,
            band_type: EqBandType::Lowshelf,
        };
        let pinned = EqBand {
            frequency: 20.0,
            ..band.clone()
        };
        assert_eq!(band.coefficients(40.0), pinned.coefficients(40.0));
    }

    #[test]
    fn test_band_parsing_defaults() {
        let band: EqBand =
            serde_json::from_str(r#"{"frequency": 1000, "band_type": "notch"}"#).unwrap();
        assert_eq!(band.gain_db, 0.0);
        assert!((band.q - 0.7071).abs() < 1e-3);
        assert_eq!(band.band_type, EqBandType::Notch);
    }

    #[test]
    fn test_coefficients_clamp_frequency() {
        let band = EqBand {
            frequency: 1.0e6,
            gain_db: 0.0,
            q: 0.707,
            band_type: EqBandType::Lowpass,
        };
        let clamped = EqBand {
            frequency: 44100.0 * 0.45,
            ..band.clone()
        };
        assert_eq!(band.coefficients(44100.0), clamped.coefficients(44100.0));
    }
}
