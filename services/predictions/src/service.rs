//! Record-level prediction dispatch

use services_common::{IndicatorRecord, Prediction};
use tracing::{debug, error, warn};

use crate::model::PredictionModel;

/// Warning-only check of the fields the models rely on
///
/// Mirrors the boundary validation elsewhere in the pipeline: a
/// suspicious record is logged and still processed.
pub fn validate_record_optional(record: &IndicatorRecord) {
    if record.pair.trim().is_empty() {
        warn!("indicator record has an empty pair");
        return;
    }
    if !(record.close.is_finite() && record.close > 0.0) {
        warn!(pair = %record.pair, close = record.close, "indicator record has unusable close");
    }
    if record.window_end_ms <= record.window_start_ms {
        warn!(
            pair = %record.pair,
            window_start_ms = record.window_start_ms,
            window_end_ms = record.window_end_ms,
            "indicator record has an inverted window"
        );
    }
    debug!(pair = %record.pair, "validated indicator record");
}

/// Apply the model to one record
///
/// A model failure (or an invalid model output) logs an error and
/// produces nothing; the stream continues with the next record.
pub fn predict_one(
    model: &dyn PredictionModel,
    record: &IndicatorRecord,
    now_ms: i64,
) -> Option<Prediction> {
    let output = match model.predict(record) {
        Ok(output) => output,
        Err(err) => {
            error!(%err, pair = %record.pair, "model invocation failed, emitting no prediction");
            return None;
        }
    };

    let prediction = Prediction {
        pair: record.pair.clone(),
        prediction_timestamp_ms: now_ms,
        prediction_value: output.prediction_value,
        confidence_score: output.confidence_score,
        model_name: output.model_name,
        model_version: output.model_version,
        prediction_horizon_minutes: output.prediction_horizon_minutes,
        features_used: output.features_used,
        input_indicators: record.clone(),
        signal_strength: output.signal_strength,
        prediction_type: output.prediction_type,
        schema_version: services_common::models::SCHEMA_VERSION.to_string(),
    };

    if let Err(err) = prediction.validate() {
        error!(%err, pair = %record.pair, "model produced an invalid prediction, dropping it");
        return None;
    }

    Some(prediction)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use services_common::PredictionType;

    use crate::model::{ModelError, ModelOutput};

    use super::*;

    struct FailingModel;

    impl PredictionModel for FailingModel {
        fn predict(&self, _record: &IndicatorRecord) -> Result<ModelOutput, ModelError> {
            Err(ModelError::Inference {
                model: "failing".into(),
                reason: "weights unavailable".into(),
            })
        }
    }

    struct InvalidOutputModel;

    impl PredictionModel for InvalidOutputModel {
        fn predict(&self, _record: &IndicatorRecord) -> Result<ModelOutput, ModelError> {
            Ok(ModelOutput {
                prediction_value: -1.0,
                confidence_score: 0.5,
                model_name: "invalid".into(),
                model_version: "1".into(),
                prediction_horizon_minutes: 5,
                features_used: vec!["close".into()],
                signal_strength: None,
                prediction_type: PredictionType::PriceDirection,
            })
        }
    }

    fn record() -> IndicatorRecord {
        IndicatorRecord {
            pair: "BTC/USD".into(),
            open: 100.0,
            high: 100.0,
            low: 100.0,
            close: 100.0,
            volume: 1.0,
            window_start_ms: 60_000,
            window_end_ms: 120_000,
            candle_seconds: 60,
            indicators: BTreeMap::new(),
            schema_version: "1.0".into(),
        }
    }

    #[test]
    fn model_failure_emits_nothing() {
        assert!(predict_one(&FailingModel, &record(), 0).is_none());
    }

    #[test]
    fn invalid_model_output_emits_nothing() {
        assert!(predict_one(&InvalidOutputModel, &record(), 0).is_none());
    }

    #[test]
    fn successful_prediction_carries_the_input_record() {
        let model = crate::model::RsiThresholdModel::new("1.0.0", 5);
        let prediction = predict_one(&model, &record(), 1_700_000_000_000).unwrap();

        assert_eq!(prediction.pair, "BTC/USD");
        assert_eq!(prediction.prediction_timestamp_ms, 1_700_000_000_000);
        assert_eq!(prediction.input_indicators, record());
        assert!(prediction.validate().is_ok());
    }
}
