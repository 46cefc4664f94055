//! Feature encoding for model inference.
//!
//! Turns validated request records into the flat feature vectors the ONNX
//! models were trained on. Column order is fixed and must match the training
//! pipeline exactly; scaling parameters and one-hot vocabularies come from
//! the preprocessor manifest exported at training time.

use crate::types::request::{CustomerData, TransactionData};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Numeric columns of the transaction schema, in training order.
const TRANSACTION_NUMERIC: [&str; 7] = [
    "Recency",
    "Frequency",
    "Monetary",
    "TransactionCount",
    "TransactionAmount",
    "Stability",
    "Value",
];

/// Categorical columns of the transaction schema, in training order.
const TRANSACTION_CATEGORICAL: [&str; 4] =
    ["PricingStrategy", "Region", "PaymentType", "DeviceType"];

/// Categorical columns of the customer schema, in training order.
const CUSTOMER_CATEGORICAL: [&str; 3] = ["CurrencyCode", "CountryCode", "ProductId"];

/// Standardization parameters for one numeric column.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerParams {
    pub mean: f64,
    pub std: f64,
}

/// Fitted preprocessing state exported by the training pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessorManifest {
    /// Per-column standardization parameters
    pub scaler: HashMap<String, ScalerParams>,
    /// Per-column one-hot vocabularies, each in training order
    pub categories: HashMap<String, Vec<String>>,
}

/// Encoder that transforms request records into model input features.
pub struct FeatureEncoder {
    manifest: PreprocessorManifest,
}

impl FeatureEncoder {
    /// Load the fitted preprocessing manifest from disk.
    ///
    /// A missing or incomplete manifest is a startup error; the server must
    /// not come up without the fitted state the models were trained against.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preprocessor manifest {:?}", path))?;
        let manifest: PreprocessorManifest = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse preprocessor manifest {:?}", path))?;

        let encoder = Self::from_manifest(manifest)?;
        info!(
            path = %path.display(),
            customer_features = encoder.customer_feature_count(),
            transaction_features = encoder.transaction_feature_count(),
            "Preprocessor manifest loaded"
        );
        Ok(encoder)
    }

    /// Build an encoder from an already-parsed manifest, validating that all
    /// required columns are covered.
    pub fn from_manifest(manifest: PreprocessorManifest) -> Result<Self> {
        for column in TRANSACTION_NUMERIC {
            if !manifest.scaler.contains_key(column) {
                bail!("Preprocessor manifest missing scaler parameters for {column}");
            }
        }
        for column in TRANSACTION_CATEGORICAL.iter().chain(CUSTOMER_CATEGORICAL.iter()) {
            match manifest.categories.get(*column) {
                Some(vocab) if !vocab.is_empty() => {}
                _ => bail!("Preprocessor manifest missing vocabulary for {column}"),
            }
        }
        Ok(Self { manifest })
    }

    /// Encode a customer record for the `/predict/*` endpoints.
    ///
    /// Numeric columns pass through raw (the customer-path models embed their
    /// own scaling); categorical columns are one-hot encoded.
    pub fn encode_customer(&self, data: &CustomerData) -> Vec<f32> {
        let mut features = Vec::with_capacity(self.customer_feature_count());

        features.push(data.recency as f32);
        features.push(data.frequency as f32);
        features.push(data.monetary as f32);
        features.push(data.transaction_hour as f32);
        features.push(data.transaction_day as f32);
        features.push(data.transaction_month as f32);

        self.push_one_hot(&mut features, "CurrencyCode", &data.currency_code);
        self.push_one_hot(&mut features, "CountryCode", &data.country_code);
        self.push_one_hot(&mut features, "ProductId", &data.product_id);

        features
    }

    /// Encode a transaction record for the `/predict_lr/` and `/predict_rf/`
    /// endpoints.
    ///
    /// Numeric columns are standardized with the fitted scaler; categorical
    /// columns are one-hot encoded.
    pub fn encode_transaction(&self, data: &TransactionData) -> Vec<f32> {
        let mut features = Vec::with_capacity(self.transaction_feature_count());

        features.push(self.scale("Recency", data.recency));
        features.push(self.scale("Frequency", data.frequency));
        features.push(self.scale("Monetary", data.monetary));
        features.push(self.scale("TransactionCount", data.transaction_count as f64));
        features.push(self.scale("TransactionAmount", data.transaction_amount));
        features.push(self.scale("Stability", data.stability));
        features.push(self.scale("Value", data.value));

        self.push_one_hot(&mut features, "PricingStrategy", &data.pricing_strategy);
        self.push_one_hot(&mut features, "Region", &data.region);
        self.push_one_hot(&mut features, "PaymentType", &data.payment_type);
        self.push_one_hot(&mut features, "DeviceType", &data.device_type);

        features
    }

    /// Width of the customer feature vector.
    pub fn customer_feature_count(&self) -> usize {
        6 + self.vocab_width(&CUSTOMER_CATEGORICAL)
    }

    /// Width of the transaction feature vector.
    pub fn transaction_feature_count(&self) -> usize {
        TRANSACTION_NUMERIC.len() + self.vocab_width(&TRANSACTION_CATEGORICAL)
    }

    fn vocab_width(&self, columns: &[&str]) -> usize {
        columns
            .iter()
            .map(|c| self.manifest.categories.get(*c).map_or(0, Vec::len))
            .sum()
    }

    /// Standardize a numeric value. Columns with zero variance pass through
    /// centered only, matching the training scaler.
    fn scale(&self, column: &str, value: f64) -> f32 {
        // Validated at construction, so the lookup cannot fail
        let params = &self.manifest.scaler[column];
        if params.std > 0.0 {
            ((value - params.mean) / params.std) as f32
        } else {
            (value - params.mean) as f32
        }
    }

    /// Append the one-hot block for a categorical value. Unknown categories
    /// produce an all-zero block, mirroring the training encoder's
    /// ignore-unknown behavior.
    fn push_one_hot(&self, features: &mut Vec<f32>, column: &str, value: &str) {
        let vocab = &self.manifest.categories[column];
        for category in vocab {
            features.push(if category == value { 1.0 } else { 0.0 });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manifest() -> PreprocessorManifest {
        let raw = serde_json::json!({
            "scaler": {
                "Recency": {"mean": 10.0, "std": 5.0},
                "Frequency": {"mean": 4.0, "std": 2.0},
                "Monetary": {"mean": 1000.0, "std": 500.0},
                "TransactionCount": {"mean": 20.0, "std": 10.0},
                "TransactionAmount": {"mean": 150.0, "std": 75.0},
                "Stability": {"mean": 0.5, "std": 0.0},
                "Value": {"mean": 200.0, "std": 100.0}
            },
            "categories": {
                "CurrencyCode": ["UGX", "KES"],
                "CountryCode": ["256", "254"],
                "ProductId": ["P1", "P2", "P3"],
                "PricingStrategy": ["0", "1", "2"],
                "Region": ["Central", "Eastern"],
                "PaymentType": ["airtime", "data"],
                "DeviceType": ["android", "ios"]
            }
        });
        serde_json::from_value(raw).unwrap()
    }

    fn customer_record() -> CustomerData {
        CustomerData {
            recency: 1.0,
            frequency: 2.0,
            monetary: 100.0,
            transaction_hour: 10,
            transaction_day: 1,
            transaction_month: 1,
            currency_code: "UGX".to_string(),
            country_code: "256".to_string(),
            product_id: "P2".to_string(),
        }
    }

    #[test]
    fn test_customer_encoding_layout() {
        let encoder = FeatureEncoder::from_manifest(test_manifest()).unwrap();
        let features = encoder.encode_customer(&customer_record());

        assert_eq!(features.len(), encoder.customer_feature_count());
        // Raw numerics in declared order
        assert_eq!(&features[0..6], &[1.0, 2.0, 100.0, 10.0, 1.0, 1.0]);
        // CurrencyCode=UGX -> [1,0], CountryCode=256 -> [1,0], ProductId=P2 -> [0,1,0]
        assert_eq!(&features[6..8], &[1.0, 0.0]);
        assert_eq!(&features[8..10], &[1.0, 0.0]);
        assert_eq!(&features[10..13], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_transaction_encoding_standardizes() {
        let encoder = FeatureEncoder::from_manifest(test_manifest()).unwrap();
        let data = TransactionData {
            recency: 15.0,
            frequency: 4.0,
            monetary: 1500.0,
            transaction_count: 30,
            transaction_amount: 150.0,
            stability: 0.7,
            value: 300.0,
            pricing_strategy: "1".to_string(),
            region: "Eastern".to_string(),
            payment_type: "airtime".to_string(),
            device_type: "ios".to_string(),
        };

        let features = encoder.encode_transaction(&data);
        assert_eq!(features.len(), encoder.transaction_feature_count());

        // (15-10)/5 = 1, (4-4)/2 = 0, (1500-1000)/500 = 1, (30-20)/10 = 1
        assert_eq!(features[0], 1.0);
        assert_eq!(features[1], 0.0);
        assert_eq!(features[2], 1.0);
        assert_eq!(features[3], 1.0);
        // Zero-variance column is centered only: 0.7 - 0.5
        assert!((features[5] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_category_encodes_to_zeros() {
        let encoder = FeatureEncoder::from_manifest(test_manifest()).unwrap();
        let mut record = customer_record();
        record.currency_code = "EUR".to_string();

        let features = encoder.encode_customer(&record);
        assert_eq!(&features[6..8], &[0.0, 0.0]);
        // Remaining blocks unaffected
        assert_eq!(&features[8..10], &[1.0, 0.0]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = FeatureEncoder::from_manifest(test_manifest()).unwrap();
        let record = customer_record();
        assert_eq!(encoder.encode_customer(&record), encoder.encode_customer(&record));
    }

    #[test]
    fn test_incomplete_manifest_rejected() {
        let mut manifest = test_manifest();
        manifest.scaler.remove("Stability");
        assert!(FeatureEncoder::from_manifest(manifest).is_err());

        let mut manifest = test_manifest();
        manifest.categories.remove("Region");
        assert!(FeatureEncoder::from_manifest(manifest).is_err());
    }

    #[test]
    fn test_missing_manifest_file_is_an_error() {
        assert!(FeatureEncoder::load("models/no_such_manifest.json").is_err());
    }
}
