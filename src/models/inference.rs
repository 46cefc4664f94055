//! Scoring engine wrapping the pre-trained classifiers

use crate::config::AppConfig;
use crate::models::loader::{LoadedModel, ModelLoader};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

/// Selects which loaded classifier scores a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    LogisticRegression,
    RandomForest,
}

impl ModelKind {
    /// Stable name used in logs and version strings
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::RandomForest => "random_forest",
        }
    }
}

/// Result of scoring one feature vector
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    /// Binary risk label (1 = high risk)
    pub label: i32,
    /// Positive-class probability (0.0 - 1.0)
    pub probability: f64,
}

/// Scoring engine holding the two pre-trained classifiers.
///
/// Sessions are wrapped in RwLock because the ONNX runtime requires a
/// mutable session handle to run; everything else is immutable for the
/// process lifetime.
pub struct ScoringEngine {
    lr: RwLock<LoadedModel>,
    rf: RwLock<LoadedModel>,
    threshold: f64,
    lr_version: String,
    rf_version: String,
}

impl ScoringEngine {
    /// Load both model artifacts per configuration. Fails if either artifact
    /// is missing or corrupt, preventing server start.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.models.onnx_threads)?;
        let dir = Path::new(&config.models.models_dir);

        let lr = loader.load_model(
            dir.join(&config.models.logistic_regression_file),
            ModelKind::LogisticRegression.name(),
        )?;
        let rf = loader.load_model(
            dir.join(&config.models.random_forest_file),
            ModelKind::RandomForest.name(),
        )?;

        info!(
            threshold = config.scoring.threshold,
            "Scoring engine initialized with both classifiers"
        );

        Ok(Self {
            lr: RwLock::new(lr),
            rf: RwLock::new(rf),
            threshold: config.scoring.threshold,
            lr_version: format!("logistic_regression_{}", config.models.lr_version),
            rf_version: format!("random_forest_{}", config.models.rf_version),
        })
    }

    /// Decision threshold in effect
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Version string attached to responses for the given model
    pub fn model_version(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::LogisticRegression => &self.lr_version,
            ModelKind::RandomForest => &self.rf_version,
        }
    }

    /// Score a feature vector: positive-class probability plus the binary
    /// label at the configured threshold.
    pub fn predict(&self, kind: ModelKind, features: &[f32]) -> Result<Prediction> {
        let probability = self.predict_proba(kind, features)?;
        Ok(Prediction {
            label: decide(probability, self.threshold),
            probability,
        })
    }

    /// Run the selected model and extract the positive-class probability.
    pub fn predict_proba(&self, kind: ModelKind, features: &[f32]) -> Result<f64> {
        let model_lock = match kind {
            ModelKind::LogisticRegression => &self.lr,
            ModelKind::RandomForest => &self.rf,
        };

        let mut model = model_lock
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        self.run_model(&mut model, features)
    }

    /// Run a single model on features
    fn run_model(&self, model: &mut LoadedModel, features: &[f32]) -> Result<f64> {
        use ort::value::Tensor;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let model_name = model.name.clone();

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        self.extract_probability(&outputs, &model.output_name, &model_name)
    }

    /// Extract the positive-class probability from model output.
    /// Handles both tensor outputs and the seq(map) format emitted by
    /// sklearn-to-ONNX converters for these classifiers.
    fn extract_probability(
        &self,
        outputs: &ort::session::SessionOutputs,
        output_name: &str,
        model_name: &str,
    ) -> Result<f64> {
        // First, try the probability output by name
        if let Some(output) = outputs.get(output_name) {
            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                let prob = positive_prob_from_tensor(&shape, data);
                debug!(model = %model_name, prob = prob, "Extracted from tensor");
                return Ok(prob);
            }

            // seq(map(int64, float)) - the default sklearn export format
            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = self.extract_from_sequence_map(output, model_name) {
                    return Ok(prob);
                }
            }
        }

        // Fallback: iterate all outputs and try extraction
        for (name, output) in outputs.iter() {
            // Skip "label" output
            if name.contains("label") {
                continue;
            }

            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                let prob = positive_prob_from_tensor(&shape, data);
                debug!(model = %model_name, output = %name, prob = prob, "Extracted from tensor (fallback)");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = self.extract_from_sequence_map(&output, model_name) {
                    return Ok(prob);
                }
            }
        }

        anyhow::bail!("No probability output found for model {}", model_name)
    }

    /// Extract probability from seq(map(int64, float)) format
    fn extract_from_sequence_map(
        &self,
        output: &ort::value::DynValue,
        model_name: &str,
    ) -> Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

        if maps.is_empty() {
            return Err(anyhow::anyhow!("Empty sequence"));
        }

        // Single-row input, so only the first map matters
        let map_value = &maps[0];
        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

        // Positive class probability
        for (class_id, prob) in &kv_pairs {
            if *class_id == 1 {
                debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
                return Ok(*prob as f64);
            }
        }

        // If no class 1, invert the class 0 probability (shouldn't happen)
        for (class_id, prob) in &kv_pairs {
            if *class_id == 0 {
                return Ok(1.0 - *prob as f64);
            }
        }

        Err(anyhow::anyhow!("No probability found in map"))
    }
}

/// Map a probability to the binary label at the given threshold.
pub fn decide(probability: f64, threshold: f64) -> i32 {
    if probability >= threshold {
        1
    } else {
        0
    }
}

/// Extract the positive-class probability from tensor data
fn positive_prob_from_tensor(shape: &ort::tensor::Shape, data: &[f32]) -> f64 {
    let dims: Vec<i64> = shape.iter().copied().collect();

    if dims.len() == 2 {
        let num_classes = dims[1] as usize;
        if num_classes >= 2 {
            // [batch, num_classes] - positive class at index 1
            return data[1] as f64;
        } else if num_classes == 1 {
            // [batch, 1] - single probability
            return data[0] as f64;
        }
    } else if dims.len() == 1 {
        let num_classes = dims[0] as usize;
        if num_classes >= 2 {
            return data[1] as f64;
        } else if num_classes == 1 {
            return data[0] as f64;
        }
    }

    // Fallback: last value
    data.last().map(|&v| v as f64).unwrap_or(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Engine construction requires the ONNX artifacts, so only the pure
    // decision logic is covered here.

    #[test]
    fn test_decide_at_threshold() {
        assert_eq!(decide(0.5, 0.5), 1);
        assert_eq!(decide(0.4999, 0.5), 0);
        assert_eq!(decide(1.0, 0.5), 1);
        assert_eq!(decide(0.0, 0.5), 0);
    }

    #[test]
    fn test_decide_respects_configured_threshold() {
        assert_eq!(decide(0.6, 0.7), 0);
        assert_eq!(decide(0.7, 0.7), 1);
    }

    #[test]
    fn test_label_matches_probability_invariant() {
        for p in [0.0, 0.1, 0.4999, 0.5, 0.75, 1.0] {
            let label = decide(p, 0.5);
            assert_eq!(label == 1, p >= 0.5);
            assert!(label == 0 || label == 1);
        }
    }

    #[test]
    fn test_model_kind_names() {
        assert_eq!(ModelKind::LogisticRegression.name(), "logistic_regression");
        assert_eq!(ModelKind::RandomForest.name(), "random_forest");
    }
}
