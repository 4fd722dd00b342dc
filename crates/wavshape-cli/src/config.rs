//! Model and EQ configuration files.
//!
//! A model descriptor names the frame transform to run and the window it
//! expects:
//!
//! ```json
//! {
//!   "name": "vocal-trim",
//!   "frame_length": 1024,
//!   "window": "periodic",
//!   "transform": { "type": "gain", "min_db": -12.0, "max_db": 0.0 }
//! }
//! ```
//!
//! An EQ file lists bands applied after the model:
//!
//! ```json
//! { "bands": [{ "frequency": 120.0, "gain_db": -3.0, "q": 0.7, "band_type": "lowshelf" }] }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use wavshape_audio::pipeline::DEFAULT_WINDOW_SIZE;
use wavshape_audio::transform::{EqBand, FrameTransform, Gain, Identity, SpectralEq};
use wavshape_audio::WindowKind;

/// File looked up when `--model` points at a directory.
pub const MODEL_FILE_NAME: &str = "model.json";

/// Parameter 0 when `--pf` is not given.
pub const DEFAULT_PARAM: f32 = 0.0;

fn default_model_name() -> String {
    "identity".to_string()
}

fn default_frame_length() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_min_db() -> f32 {
    -24.0
}

/// Transform selected by a model descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformSpec {
    /// Pass frames through.
    #[default]
    Identity,
    /// Gain controlled by the model parameter.
    Gain {
        /// Gain at parameter 0.
        #[serde(default = "default_min_db")]
        min_db: f32,
        /// Gain at parameter 1.
        #[serde(default)]
        max_db: f32,
    },
    /// Fixed spectral EQ.
    Eq {
        /// EQ bands.
        bands: Vec<EqBand>,
    },
}

/// Model descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Display name.
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Samples per analysis window.
    #[serde(default = "default_frame_length")]
    pub frame_length: usize,
    /// Hann window variant.
    #[serde(default)]
    pub window: WindowKind,
    /// Transform to run on each window.
    #[serde(default)]
    pub transform: TransformSpec,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            frame_length: default_frame_length(),
            window: WindowKind::default(),
            transform: TransformSpec::default(),
        }
    }
}

impl ModelConfig {
    /// Loads a descriptor from a file, or from `model.json` inside a directory.
    pub fn load(path: &Path) -> Result<Self> {
        let file = resolve_model_path(path);
        let text = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read model descriptor: {}", file.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse model descriptor: {}", file.display()))
    }

    /// Number of tunable parameters.
    pub fn param_count(&self) -> usize {
        match self.transform {
            TransformSpec::Gain { .. } => 1,
            TransformSpec::Identity | TransformSpec::Eq { .. } => 0,
        }
    }

    /// Instantiates the transform.
    ///
    /// `param` feeds parameter 0 ([`DEFAULT_PARAM`] when absent) and is ignored
    /// by parameterless transforms.
    pub fn build(
        &self,
        sample_rate: u32,
        frame_length: usize,
        param: Option<f32>,
    ) -> Result<Box<dyn FrameTransform>> {
        let transform: Box<dyn FrameTransform> = match &self.transform {
            TransformSpec::Identity => Box::new(Identity),
            TransformSpec::Gain { min_db, max_db } => {
                let param = param.unwrap_or(DEFAULT_PARAM);
                Box::new(Gain::from_param(param, *min_db, *max_db))
            }
            TransformSpec::Eq { bands } => Box::new(
                SpectralEq::new(bands, sample_rate, frame_length)
                    .with_context(|| format!("Failed to build EQ for model '{}'", self.name))?,
            ),
        };
        Ok(transform)
    }
}

/// EQ configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EqConfig {
    /// Bands applied in one combined gain curve.
    #[serde(default)]
    pub bands: Vec<EqBand>,
}

impl EqConfig {
    /// Loads an EQ configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read EQ config: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse EQ config: {}", path.display()))
    }
}

/// Clamps a model parameter to [0, 1]. NaN maps to 0.
pub fn clamp_param(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

fn resolve_model_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(MODEL_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use wavshape_audio::transform::EqBandType;

    #[test]
    fn test_minimal_descriptor_uses_defaults() {
        let model: ModelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(model, ModelConfig::default());
        assert_eq!(model.frame_length, 1024);
        assert_eq!(model.param_count(), 0);
    }

    #[test]
    fn test_gain_descriptor() {
        let model: ModelConfig = serde_json::from_str(
            r#"{"name": "trim", "window": "periodic", "transform": {"type": "gain", "max_db": 6}}"#,
        )
        .unwrap();
        assert_eq!(model.window, WindowKind::Periodic);
        assert_eq!(
            model.transform,
            TransformSpec::Gain {
                min_db: -24.0,
                max_db: 6.0
            }
        );
        assert_eq!(model.param_count(), 1);

        let mut transform = model.build(44100, 1024, Some(1.0)).unwrap();
        let mut out = [0.0; 1];
        transform.process(&[0.5], &mut out).unwrap();
        assert!((out[0] - 0.5 * 1.995).abs() < 1e-3);
    }

    #[test]
    fn test_gain_without_param_uses_min_db() {
        let model = ModelConfig {
            transform: TransformSpec::Gain {
                min_db: -20.0,
                max_db: 0.0,
            },
            ..ModelConfig::default()
        };
        let mut transform = model.build(44100, 1024, None).unwrap();
        let mut out = [0.0; 1];
        transform.process(&[0.5], &mut out).unwrap();
        assert!((out[0] - 0.05).abs() < 1e-4, "{}", out[0]);
    }

    #[test]
    fn test_eq_descriptor_builds_fixed_length() {
        let model = ModelConfig {
            transform: TransformSpec::Eq {
                bands: vec![EqBand {
                    frequency: 1000.0,
                    gain_db: -6.0,
                    q: 1.0,
                    band_type: EqBandType::Peak,
                }],
            },
            ..ModelConfig::default()
        };
        let transform = model.build(48000, 512, None).unwrap();
        assert_eq!(transform.frame_len(), Some(512));
        assert_eq!(transform.name(), "eq");
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(MODEL_FILE_NAME),
            r#"{"name": "from-dir", "frame_length": 256}"#,
        )
        .unwrap();

        let model = ModelConfig::load(dir.path()).unwrap();
        assert_eq!(model.name, "from-dir");
        assert_eq!(model.frame_length, 256);
    }

    #[test]
    fn test_load_reports_path() {
        let dir = TempDir::new().unwrap();
        let err = ModelConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_eq_config_parse() {
        let eq: EqConfig = serde_json::from_str(
            r#"{"bands": [{"frequency": 80, "band_type": "highpass"}]}"#,
        )
        .unwrap();
        assert_eq!(eq.bands.len(), 1);
        assert_eq!(eq.bands[0].band_type, EqBandType::Highpass);
    }

    #[test]
    fn test_clamp_param() {
        assert_eq!(clamp_param(-0.5), 0.0);
        assert_eq!(clamp_param(0.25), 0.25);
        assert_eq!(clamp_param(7.0), 1.0);
        assert_eq!(clamp_param(f32::NAN), 0.0);
    }
}
