//! Credit Scoring API Library
//!
//! An HTTP serving layer for two pre-trained credit risk classifiers.
//! Model artifacts are loaded once at startup and scored behind JSON
//! prediction endpoints; there is no training or fitting in this crate.

pub mod config;
pub mod encoder;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use encoder::FeatureEncoder;
pub use metrics::ApiMetrics;
pub use models::inference::{ModelKind, ScoringEngine};
pub use server::AppState;
pub use types::{CustomerData, PredictionResponse, TransactionData};
