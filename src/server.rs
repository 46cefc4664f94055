//! HTTP routing and request handlers.
//!
//! All handlers are stateless: the loaded models, the feature encoder, and
//! the metrics collector live in a shared, read-only `AppState` built once at
//! startup. Malformed request bodies are rejected by the `Json` extractor
//! before any scoring attempt; scoring failures are logged and collapsed into
//! a generic internal error with no failure detail on the wire.

use crate::config::AppConfig;
use crate::encoder::FeatureEncoder;
use crate::metrics::ApiMetrics;
use crate::models::inference::{ModelKind, ScoringEngine};
use crate::types::request::{CustomerData, TransactionData};
use crate::types::response::{HealthResponse, LabelResponse, ModelVersions, PredictionResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Shared application state, initialized once before serving begins
pub struct AppState {
    pub engine: ScoringEngine,
    pub encoder: FeatureEncoder,
    pub metrics: Arc<ApiMetrics>,
    pub versions: ModelVersions,
}

impl AppState {
    /// Build state from configuration: loads both model artifacts and the
    /// preprocessor manifest, failing fast if any is missing or corrupt.
    pub fn from_config(config: &AppConfig, metrics: Arc<ApiMetrics>) -> anyhow::Result<Self> {
        let engine = ScoringEngine::new(config)?;
        let encoder = FeatureEncoder::load(
            std::path::Path::new(&config.models.models_dir).join(&config.models.preprocessor_file),
        )?;

        Ok(Self {
            engine,
            encoder,
            metrics,
            versions: ModelVersions {
                logistic_regression: config.models.lr_version.clone(),
                random_forest: config.models.rf_version.clone(),
            },
        })
    }
}

/// Build the API router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/predict/lr", post(predict_customer_lr))
        .route("/predict/rf", post(predict_customer_rf))
        .route("/predict_lr/", post(predict_transaction_lr))
        .route("/predict_rf/", post(predict_transaction_rf))
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Credit Scoring API".to_string(),
        status: "healthy".to_string(),
        model_versions: state.versions.clone(),
    })
}

async fn predict_customer_lr(
    State(state): State<Arc<AppState>>,
    Json(data): Json<CustomerData>,
) -> Result<Json<PredictionResponse>, ApiError> {
    score_customer(&state, ModelKind::LogisticRegression, &data)
}

async fn predict_customer_rf(
    State(state): State<Arc<AppState>>,
    Json(data): Json<CustomerData>,
) -> Result<Json<PredictionResponse>, ApiError> {
    score_customer(&state, ModelKind::RandomForest, &data)
}

async fn predict_transaction_lr(
    State(state): State<Arc<AppState>>,
    Json(data): Json<TransactionData>,
) -> Result<Json<LabelResponse>, ApiError> {
    score_transaction(&state, ModelKind::LogisticRegression, &data)
}

async fn predict_transaction_rf(
    State(state): State<Arc<AppState>>,
    Json(data): Json<TransactionData>,
) -> Result<Json<LabelResponse>, ApiError> {
    score_transaction(&state, ModelKind::RandomForest, &data)
}

/// Score a customer record, returning the full response with probability,
/// model version, and timestamp.
fn score_customer(
    state: &AppState,
    kind: ModelKind,
    data: &CustomerData,
) -> Result<Json<PredictionResponse>, ApiError> {
    let started = Instant::now();
    let features = state.encoder.encode_customer(data);

    match state.engine.predict(kind, &features) {
        Ok(prediction) => {
            state.metrics.record_prediction(
                kind.name(),
                started.elapsed(),
                prediction.probability,
                prediction.label,
            );
            debug!(
                model = kind.name(),
                probability = prediction.probability,
                label = prediction.label,
                "Customer record scored"
            );
            Ok(Json(PredictionResponse::new(
                prediction.label,
                prediction.probability,
                state.engine.model_version(kind),
            )))
        }
        Err(e) => {
            error!(model = kind.name(), error = %e, "Prediction error");
            state.metrics.record_failure(kind.name());
            Err(ApiError::prediction_failed())
        }
    }
}

/// Score a transaction record, returning the label-only response.
fn score_transaction(
    state: &AppState,
    kind: ModelKind,
    data: &TransactionData,
) -> Result<Json<LabelResponse>, ApiError> {
    let started = Instant::now();
    let features = state.encoder.encode_transaction(data);

    match state.engine.predict(kind, &features) {
        Ok(prediction) => {
            state.metrics.record_prediction(
                kind.name(),
                started.elapsed(),
                prediction.probability,
                prediction.label,
            );
            Ok(Json(LabelResponse {
                prediction: prediction.label,
            }))
        }
        Err(e) => {
            error!(model = kind.name(), error = %e, "Prediction error");
            state.metrics.record_failure(kind.name());
            Err(ApiError::prediction_failed())
        }
    }
}

/// Error returned to callers. Scoring failures are deliberately generic:
/// shape mismatches and model-internal errors are indistinguishable on the
/// wire and only discriminated in the logs.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn prediction_failed() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: "Prediction failed".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.detail }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Handler round-trips need the ONNX artifacts loaded; those are covered
    // by running the request-generator tool against a live server.

    #[test]
    fn test_prediction_failed_is_generic_500() {
        let response = ApiError::prediction_failed().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_health_payload_shape() {
        let payload = HealthResponse {
            message: "Credit Scoring API".to_string(),
            status: "healthy".to_string(),
            model_versions: ModelVersions {
                logistic_regression: "1.0".to_string(),
                random_forest: "1.0".to_string(),
            },
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["model_versions"]["logistic_regression"], "1.0");
        assert_eq!(json["model_versions"]["random_forest"], "1.0");
    }
}
