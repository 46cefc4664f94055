//! Model loading and scoring

pub mod inference;
pub mod loader;

pub use inference::{ModelKind, Prediction, ScoringEngine};
pub use loader::{LoadedModel, ModelLoader};
