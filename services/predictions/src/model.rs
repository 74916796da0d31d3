//! The pluggable prediction model seam

use services_common::{IndicatorRecord, PredictionType};
use thiserror::Error;

/// RSI thresholds for the reference policy
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
/// Defaults applied when the input record lacks usable values
const DEFAULT_RSI: f64 = 50.0;
const DEFAULT_CLOSE: f64 = 100.0;

const PRICE_INCREASE_MULTIPLIER: f64 = 1.02;
const PRICE_DECREASE_MULTIPLIER: f64 = 0.98;
const HIGH_CONFIDENCE: f64 = 0.7;
const MEDIUM_CONFIDENCE: f64 = 0.5;
const POSITIVE_SIGNAL: f64 = 0.5;
const NEGATIVE_SIGNAL: f64 = -0.5;
const NEUTRAL_SIGNAL: f64 = 0.0;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model `{model}` failed: {reason}")]
    Inference { model: String, reason: String },
}

/// What a model produces for one indicator record
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub prediction_value: f64,
    pub confidence_score: f64,
    pub model_name: String,
    pub model_version: String,
    pub prediction_horizon_minutes: u32,
    pub features_used: Vec<String>,
    pub signal_strength: Option<f64>,
    pub prediction_type: PredictionType,
}

/// A model turning indicator records into predictions
pub trait PredictionModel: Send + Sync {
    fn predict(&self, record: &IndicatorRecord) -> Result<ModelOutput, ModelError>;
}

/// Reference model: a deterministic threshold policy on `rsi_14`
///
/// Oversold (< 30) predicts a 2% rise, overbought (> 70) a 2% drop,
/// anything in between no change. Stands in for a trained regressor
/// behind the same trait.
#[derive(Debug, Clone)]
pub struct RsiThresholdModel {
    model_version: String,
    prediction_horizon_minutes: u32,
}

impl RsiThresholdModel {
    pub const NAME: &'static str = "rsi_threshold";

    pub fn new(model_version: impl Into<String>, prediction_horizon_minutes: u32) -> Self {
        Self {
            model_version: model_version.into(),
            prediction_horizon_minutes,
        }
    }
}

impl PredictionModel for RsiThresholdModel {
    fn predict(&self, record: &IndicatorRecord) -> Result<ModelOutput, ModelError> {
        let rsi_14 = record.indicator("rsi_14").unwrap_or(DEFAULT_RSI);
        let close = if record.close.is_finite() && record.close > 0.0 {
            record.close
        } else {
            DEFAULT_CLOSE
        };

        let (prediction_value, confidence_score, signal_strength) = if rsi_14 < RSI_OVERSOLD {
            (close * PRICE_INCREASE_MULTIPLIER, HIGH_CONFIDENCE, POSITIVE_SIGNAL)
        } else if rsi_14 > RSI_OVERBOUGHT {
            (close * PRICE_DECREASE_MULTIPLIER, HIGH_CONFIDENCE, NEGATIVE_SIGNAL)
        } else {
            (close, MEDIUM_CONFIDENCE, NEUTRAL_SIGNAL)
        };

        Ok(ModelOutput {
            prediction_value,
            confidence_score,
            model_name: Self::NAME.to_string(),
            model_version: self.model_version.clone(),
            prediction_horizon_minutes: self.prediction_horizon_minutes,
            features_used: vec!["rsi_14".to_string(), "close".to_string()],
            signal_strength: Some(signal_strength),
            prediction_type: PredictionType::PriceDirection,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn record(rsi_14: Option<f64>, close: f64) -> IndicatorRecord {
        let mut indicators = BTreeMap::new();
        if let Some(value) = rsi_14 {
            indicators.insert("rsi_14".to_string(), value);
        }
        IndicatorRecord {
            pair: "BTC/USD".into(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
            window_start_ms: 60_000,
            window_end_ms: 120_000,
            candle_seconds: 60,
            indicators,
            schema_version: "1.0".into(),
        }
    }

    fn model() -> RsiThresholdModel {
        RsiThresholdModel::new("1.0.0", 5)
    }

    #[test]
    fn oversold_predicts_a_rise() {
        let output = model().predict(&record(Some(25.0), 1000.0)).unwrap();
        assert_eq!(output.prediction_value, 1020.0);
        assert_eq!(output.confidence_score, 0.7);
        assert_eq!(output.signal_strength, Some(0.5));
    }

    #[test]
    fn overbought_predicts_a_drop() {
        let output = model().predict(&record(Some(75.0), 1000.0)).unwrap();
        assert_eq!(output.prediction_value, 980.0);
        assert_eq!(output.confidence_score, 0.7);
        assert_eq!(output.signal_strength, Some(-0.5));
    }

    #[test]
    fn neutral_rsi_predicts_no_change() {
        let output = model().predict(&record(Some(50.0), 1000.0)).unwrap();
        assert_eq!(output.prediction_value, 1000.0);
        assert_eq!(output.confidence_score, 0.5);
        assert_eq!(output.signal_strength, Some(0.0));
    }

    #[test]
    fn thresholds_are_exclusive() {
        // Exactly 30 and exactly 70 are neutral.
        assert_eq!(model().predict(&record(Some(30.0), 1000.0)).unwrap().prediction_value, 1000.0);
        assert_eq!(model().predict(&record(Some(70.0), 1000.0)).unwrap().prediction_value, 1000.0);
    }

    #[test]
    fn missing_rsi_defaults_to_neutral() {
        let output = model().predict(&record(None, 1000.0)).unwrap();
        assert_eq!(output.prediction_value, 1000.0);
        assert_eq!(output.confidence_score, 0.5);
    }

    #[test]
    fn unusable_close_falls_back_to_default() {
        let output = model().predict(&record(Some(25.0), 0.0)).unwrap();
        assert_eq!(output.prediction_value, 102.0);
    }

    #[test]
    fn output_metadata_is_stable() {
        let output = model().predict(&record(Some(50.0), 100.0)).unwrap();
        assert_eq!(output.model_name, "rsi_threshold");
        assert_eq!(output.model_version, "1.0.0");
        assert_eq!(output.prediction_horizon_minutes, 5);
        assert_eq!(output.features_used, vec!["rsi_14", "close"]);
        assert_eq!(output.prediction_type, PredictionType::PriceDirection);
    }
}
