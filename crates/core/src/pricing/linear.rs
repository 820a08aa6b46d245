//! Linear house price model
//!
//! Deterministic `intercept + sum(coefficient * feature)` regression over the
//! six-feature tuple. Weights come from a JSON model file exported by the
//! training pipeline, or from the built-in baseline.

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::{PredictionInput, PricePredictor, PredictorError};

/// Trained linear regression weights with version metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearPriceModel {
    /// Model version reported in logs and health output
    pub version: String,
    /// Bias term
    pub intercept: f64,
    /// One weight per feature, in [`PredictionInput::FEATURE_NAMES`] order
    pub coefficients: [f64; 6],
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("could not read model file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse model file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: serde_json::Error },
    #[error("model file `{path}` contains non-finite weights")]
    NonFiniteWeights { path: PathBuf },
}

impl Default for LinearPriceModel {
    fn default() -> Self {
        Self::baseline()
    }
}

impl LinearPriceModel {
    pub fn new(version: impl Into<String>, intercept: f64, coefficients: [f64; 6]) -> Self {
        Self { version: version.into(), intercept, coefficients }
    }

    /// Built-in weights fitted on living area, bedroom and bathroom counts.
    pub fn baseline() -> Self {
        Self::new(
            "baseline-1",
            40_000.0,
            [100.0, -25_000.0, 20_000.0, 20_000.0, 5_000.0, 15_000.0],
        )
    }

    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ModelLoadError::ReadFile { path: path.to_path_buf(), source })?;
        let model = serde_json::from_str::<Self>(&raw)
            .map_err(|source| ModelLoadError::ParseFile { path: path.to_path_buf(), source })?;

        let finite = model.intercept.is_finite()
            && model.coefficients.iter().all(|weight| weight.is_finite());
        if !finite {
            return Err(ModelLoadError::NonFiniteWeights { path: path.to_path_buf() });
        }

        Ok(model)
    }

    /// Load from `path` when configured, otherwise fall back to the baseline.
    pub fn load_or_baseline(path: Option<&Path>) -> Result<Self, ModelLoadError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::baseline()),
        }
    }

    pub fn raw_prediction(&self, input: &PredictionInput) -> f64 {
        self.coefficients
            .iter()
            .zip(input.as_features().iter())
            .map(|(weight, feature)| weight * feature)
            .sum::<f64>()
            + self.intercept
    }
}

impl PricePredictor for LinearPriceModel {
    fn predict(&self, input: &PredictionInput) -> Result<Decimal, PredictorError> {
        let raw = self.raw_prediction(input);
        if !raw.is_finite() {
            return Err(PredictorError::NonFinite(*input));
        }

        Decimal::from_f64_retain(raw)
            .map(|price| price.round_dp(2))
            .ok_or_else(|| PredictorError::Unrepresentable(raw.to_string()))
    }
}
