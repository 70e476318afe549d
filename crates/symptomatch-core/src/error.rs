//! Error types for Symptomatch.
//!
//! Only startup work (configuration, case source, model artifact) returns
//! these. Per-request extraction and diagnosis never fail.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Case source unavailable: {0}")]
    DatasetMissing(String),

    #[error("Case source format error: {0}")]
    DatasetFormat(String),

    #[error("Case source contains no valid records: {0}")]
    EmptyDataset(String),

    #[error("Model artifact error: {0}")]
    ModelArtifact(String),

    #[error("Predictor unavailable: {0}")]
    PredictorUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
