use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

use super::default_schema_version;
use super::IndicatorRecord;

/// What kind of statement the model is making
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionType {
    PriceDirection,
    PriceValue,
    Volatility,
}

/// A short-horizon price prediction for one indicator record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub pair: String,
    pub prediction_timestamp_ms: i64,
    pub prediction_value: f64,
    pub confidence_score: f64,
    pub model_name: String,
    pub model_version: String,
    pub prediction_horizon_minutes: u32,
    pub features_used: Vec<String>,
    pub input_indicators: IndicatorRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<f64>,
    pub prediction_type: PredictionType,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
}

impl Prediction {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.prediction_value <= 0.0 {
            return Err(ValidationError::NonPositivePrediction(self.prediction_value));
        }
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(ValidationError::ConfidenceOutOfRange(self.confidence_score));
        }
        if let Some(strength) = self.signal_strength {
            if !(-1.0..=1.0).contains(&strength) {
                return Err(ValidationError::SignalStrengthOutOfRange(strength));
            }
        }
        if self.prediction_horizon_minutes == 0 {
            return Err(ValidationError::NonPositiveHorizon);
        }
        if self.features_used.is_empty() {
            return Err(ValidationError::EmptyFeatures);
        }
        if self.model_name.trim().is_empty() {
            return Err(ValidationError::EmptyModelName);
        }
        if self.model_version.trim().is_empty() {
            return Err(ValidationError::EmptyModelVersion);
        }
        Ok(())
    }
}
