//! Type definitions for the credit scoring API

pub mod request;
pub mod response;

pub use request::{CustomerData, TransactionData};
pub use response::{HealthResponse, LabelResponse, ModelVersions, PredictionResponse};
