//! Symptomatch Core: symptom identifiers, demographics, configuration, errors.

pub mod config;
pub mod error;
pub mod symptom;

pub use config::{
    CombineWeights, DemographicPolicy, EngineConfig, PredictorKind, SimilarityMetric,
};
pub use error::{Error, Result};
pub use symptom::{Demographics, SymptomKey, SymptomSet, UNKNOWN_TAG};
