//! Biquad coefficient design and frequency response.
//!
//! Coefficients follow the Audio EQ Cookbook. The spectral EQ never runs these
//! as recursive filters; it samples their magnitude response at FFT bin
//! frequencies and applies that as a zero-phase gain curve.

use std::f64::consts::PI;

/// Normalized biquad coefficients (`a0 == 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

/// Angular frequency terms shared by every design.
struct Omega {
    sin: f64,
    cos: f64,
}

impl Omega {
    fn new(frequency: f64, sample_rate: f64) -> Self {
        let w = 2.0 * PI * frequency / sample_rate;
        Self {
            sin: w.sin(),
            cos: w.cos(),
        }
    }

    /// `q` must be clamped away from zero by the caller.
    fn alpha(&self, q: f64) -> f64 {
        self.sin / (2.0 * q)
    }
}

impl BiquadCoeffs {
    fn normalized(b: [f64; 3], a: [f64; 3]) -> Self {
        let a0 = a[0];
        Self {
            b0: b[0] / a0,
            b1: b[1] / a0,
            b2: b[2] / a0,
            a1: a[1] / a0,
            a2: a[2] / a0,
        }
    }

    /// Lowpass response.
    ///
    /// # Arguments
    /// * `cutoff` - Cutoff frequency in Hz
    /// * `q` - Q factor, 0.707 is Butterworth
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let w = Omega::new(cutoff, sample_rate);
        let alpha = w.alpha(q.max(0.5));
        let side = (1.0 - w.cos) / 2.0;
        Self::normalized(
            [side, 1.0 - w.cos, side],
            [1.0 + alpha, -2.0 * w.cos, 1.0 - alpha],
        )
    }

    /// Highpass response.
    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let w = Omega::new(cutoff, sample_rate);
        let alpha = w.alpha(q.max(0.5));
        let side = (1.0 + w.cos) / 2.0;
        Self::normalized(
            [side, -(1.0 + w.cos), side],
            [1.0 + alpha, -2.0 * w.cos, 1.0 - alpha],
        )
    }

    /// Notch (band-reject) response.
    pub fn notch(center: f64, q: f64, sample_rate: f64) -> Self {
        let w = Omega::new(center, sample_rate);
        let alpha = w.alpha(q.max(0.5));
        Self::normalized(
            [1.0, -2.0 * w.cos, 1.0],
            [1.0 + alpha, -2.0 * w.cos, 1.0 - alpha],
        )
    }

    /// Peaking EQ response.
    ///
    /// # Arguments
    /// * `frequency` - Center frequency in Hz
    /// * `q` - Q factor
    /// * `db_gain` - Gain in dB (positive for boost, negative for cut)
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn peaking_eq(frequency: f64, q: f64, db_gain: f64, sample_rate: f64) -> Self {
        let a = 10.0_f64.powf(db_gain / 40.0);
        let w = Omega::new(frequency, sample_rate);
        let alpha = w.alpha(q.max(0.5));
        Self::normalized(
            [1.0 + alpha * a, -2.0 * w.cos, 1.0 - alpha * a],
            [1.0 + alpha / a, -2.0 * w.cos, 1.0 - alpha / a],
        )
    }

    /// Low-shelf response with a fixed 0.9 shelf slope.
    pub fn low_shelf(frequency: f64, db_gain: f64, sample_rate: f64) -> Self {
        let a = 10.0_f64.powf(db_gain / 40.0);
        let w = Omega::new(frequency, sample_rate);
        let k = 2.0 * a.sqrt() * shelf_alpha(&w, a);
        Self::normalized(
            [
                a * ((a + 1.0) - (a - 1.0) * w.cos + k),
                2.0 * a * ((a - 1.0) - (a + 1.0) * w.cos),
                a * ((a + 1.0) - (a - 1.0) * w.cos - k),
            ],
            [
                (a + 1.0) + (a - 1.0) * w.cos + k,
                -2.0 * ((a - 1.0) + (a + 1.0) * w.cos),
                (a + 1.0) + (a - 1.0) * w.cos - k,
            ],
        )
    }

    /// High-shelf response with a fixed 0.9 shelf slope.
    pub fn high_shelf(frequency: f64, db_gain: f64, sample_rate: f64) -> Self {
        let a = 10.0_f64.powf(db_gain / 40.0);
        let w = Omega::new(frequency, sample_rate);
        let k = 2.0 * a.sqrt() * shelf_alpha(&w, a);
        Self::normalized(
            [
                a * ((a + 1.0) + (a - 1.0) * w.cos + k),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * w.cos),
                a * ((a + 1.0) + (a - 1.0) * w.cos - k),
            ],
            [
                (a + 1.0) - (a - 1.0) * w.cos + k,
                2.0 * ((a - 1.0) - (a + 1.0) * w.cos),
                (a + 1.0) - (a - 1.0) * w.cos - k,
            ],
        )
    }

    /// Magnitude response `|H(e^jw)|` at `frequency`.
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let den = (den_re * den_re + den_im * den_im).sqrt();
        if den <= f64::EPSILON {
            return 0.0;
        }
        (num_re * num_re + num_im * num_im).sqrt() / den
    }
}

fn shelf_alpha(w: &Omega, a: f64) -> f64 {
    w.sin / 2.0 * ((a + 1.0 / a) * (1.0 / 0.9 - 1.0) + 2.0).sqrt()
}
