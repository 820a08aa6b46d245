//! Price prediction seam.
//!
//! The dialogue engine only knows the [`PricePredictor`] trait. A deployable
//! linear model lives in [`linear`]; tests substitute recording fakes.

pub mod format;
pub mod linear;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use format::format_currency;
pub use linear::{LinearPriceModel, ModelLoadError};

/// Fixed-order feature tuple consumed by a predictor.
///
/// Order: `GrLivArea, BedroomAbvGr, FullBath, BsmtFullBath, BsmtHalfBath, HalfBath`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictionInput {
    pub gr_liv_area: u64,
    pub bedroom_abv_gr: u32,
    pub full_bath: u32,
    pub bsmt_full_bath: u32,
    pub bsmt_half_bath: u32,
    pub half_bath: u32,
}

impl PredictionInput {
    pub const FEATURE_NAMES: [&'static str; 6] =
        ["GrLivArea", "BedroomAbvGr", "FullBath", "BsmtFullBath", "BsmtHalfBath", "HalfBath"];

    pub fn as_tuple(&self) -> (u64, u32, u32, u32, u32, u32) {
        (
            self.gr_liv_area,
            self.bedroom_abv_gr,
            self.full_bath,
            self.bsmt_full_bath,
            self.bsmt_half_bath,
            self.half_bath,
        )
    }

    pub fn as_features(&self) -> [f64; 6] {
        [
            self.gr_liv_area as f64,
            f64::from(self.bedroom_abv_gr),
            f64::from(self.full_bath),
            f64::from(self.bsmt_full_bath),
            f64::from(self.bsmt_half_bath),
            f64::from(self.half_bath),
        ]
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PredictorError {
    #[error("predictor produced a non-finite price for {0:?}")]
    NonFinite(PredictionInput),
    #[error("predictor price {0} cannot be represented as a decimal amount")]
    Unrepresentable(String),
    #[error("predictor unavailable: {0}")]
    Unavailable(String),
}

pub trait PricePredictor: Send + Sync {
    fn predict(&self, input: &PredictionInput) -> Result<Decimal, PredictorError>;
}

impl<P> PricePredictor for &P
where
    P: PricePredictor + ?Sized,
{
    fn predict(&self, input: &PredictionInput) -> Result<Decimal, PredictorError> {
        (**self).predict(input)
    }
}

impl<P> PricePredictor for std::sync::Arc<P>
where
    P: PricePredictor + ?Sized,
{
    fn predict(&self, input: &PredictionInput) -> Result<Decimal, PredictorError> {
        (**self).predict(input)
    }
}
