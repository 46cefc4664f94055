//! Response payloads returned by the prediction endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full scoring response from `/predict/lr` and `/predict/rf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Binary risk label (1 = high risk)
    pub prediction: i32,

    /// Positive-class probability, rounded to 4 decimals
    pub probability: f64,

    /// Identifier of the model that produced the score
    pub model_version: String,

    /// Scoring time (UTC, ISO-8601)
    pub timestamp: DateTime<Utc>,
}

impl PredictionResponse {
    /// Build a response, rounding the probability and stamping the current time.
    pub fn new(prediction: i32, probability: f64, model_version: &str) -> Self {
        Self {
            prediction,
            probability: round4(probability),
            model_version: model_version.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Label-only response from `/predict_lr/` and `/predict_rf/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelResponse {
    pub prediction: i32,
}

/// Static status payload for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
    pub status: String,
    pub model_versions: ModelVersions,
}

/// Version strings reported for each loaded classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVersions {
    pub logistic_regression: String,
    pub random_forest: String,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_rounding() {
        let response = PredictionResponse::new(1, 0.723456, "logistic_regression_1.0");
        assert_eq!(response.probability, 0.7235);
        assert_eq!(response.prediction, 1);
        assert_eq!(response.model_version, "logistic_regression_1.0");
    }

    #[test]
    fn test_label_response_shape() {
        let json = serde_json::to_string(&LabelResponse { prediction: 0 }).unwrap();
        assert_eq!(json, r#"{"prediction":0}"#);
    }

    #[test]
    fn test_timestamp_is_iso8601() {
        let response = PredictionResponse::new(0, 0.1, "random_forest_1.0");
        let json = serde_json::to_value(&response).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        assert!(ts.contains('T'));
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
