//! Symptomatch Infer: statistical predictor backends and model artifacts.
//!
//! Provides the `PredictorBackend` trait for the secondary diagnosis signal.
//! `create_predictor` builds the configured backend; when it cannot (no
//! shared features, unreadable artifact, disabled) it falls back to
//! `UnavailablePredictor` and diagnosis runs on case matching alone.

pub mod cache;
pub mod linear;
pub mod predictor;

pub use cache::{CachedPredictor, PredictionCache};
pub use linear::{LinearModel, LinearPredictor};
pub use predictor::{Prediction, PredictorBackend, UnavailablePredictor};

use std::sync::Arc;
use std::time::Duration;

use symptomatch_cases::CaseDataset;
use symptomatch_core::{EngineConfig, PredictorKind, Result};
use symptomatch_extract::Vocabulary;

/// Create the configured predictor, degrading to `UnavailablePredictor`.
pub fn create_predictor(
    config: &EngineConfig,
    vocabulary: &Vocabulary,
    dataset: &CaseDataset,
) -> Arc<dyn PredictorBackend> {
    let built: Result<LinearPredictor> = match config.predictor {
        PredictorKind::None => {
            tracing::info!("Statistical predictor disabled. Using case matching only.");
            return Arc::new(UnavailablePredictor::new("disabled by configuration"));
        }
        PredictorKind::NaiveBayes => LinearModel::fit_naive_bayes(vocabulary, dataset)
            .map(|m| LinearPredictor::new(m, "naive_bayes")),
        PredictorKind::Artifact => match &config.model_path {
            Some(path) => LinearModel::load(path, vocabulary).map(|m| LinearPredictor::new(m, "artifact")),
            None => Err(symptomatch_core::Error::Config(
                "predictor 'artifact' requires model_path".into(),
            )),
        },
    };

    let predictor = match built {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("Statistical predictor unavailable: {}. Falling back to case matching only.", e);
            return Arc::new(UnavailablePredictor::new(e.to_string()));
        }
    };

    tracing::info!(
        "Using {} predictor (labels={}, features={})",
        predictor.name(),
        predictor.model().labels().len(),
        predictor.model().feature_count()
    );

    if config.prediction_cache_size == 0 {
        return Arc::new(predictor);
    }
    let cache = PredictionCache::new(
        config.prediction_cache_size,
        Duration::from_secs(config.prediction_cache_ttl_secs),
    );
    Arc::new(CachedPredictor::new(Arc::new(predictor), cache))
}
