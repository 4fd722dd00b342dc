//! Hann window coefficients.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Hann window variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// `0.5 * (1 - cos(2*pi*s / (N - 1)))`. Endpoints are both zero; the
    /// half-overlapped sum ripples slightly around 1.
    #[default]
    Symmetric,
    /// `0.5 * (1 - cos(2*pi*s / N))`. Half-overlapped copies sum to exactly 1.
    Periodic,
}

impl WindowKind {
    /// Lowercase name, as used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            WindowKind::Symmetric => "symmetric",
            WindowKind::Periodic => "periodic",
        }
    }
}

/// Precomputed Hann window.
#[derive(Debug, Clone, PartialEq)]
pub struct HannWindow {
    kind: WindowKind,
    coeffs: Vec<f32>,
}

impl HannWindow {
    /// Computes `len` coefficients.
    pub fn new(len: usize, kind: WindowKind) -> Self {
        let denom = match kind {
            WindowKind::Symmetric => len.saturating_sub(1).max(1),
            WindowKind::Periodic => len.max(1),
        } as f64;
        let coeffs = (0..len)
            .map(|s| (0.5 * (1.0 - (2.0 * PI * s as f64 / denom).cos())) as f32)
            .collect();
        Self { kind, coeffs }
    }

    /// Multiplies `frame` by the window in place.
    pub fn apply(&self, frame: &mut [f32]) {
        for (sample, &w) in frame.iter_mut().zip(&self.coeffs) {
            *sample *= w;
        }
    }

    /// Window coefficients.
    pub fn coefficients(&self) -> &[f32] {
        &self.coeffs
    }

    /// Window variant.
    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// Returns true for a zero-length window.
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }
}
