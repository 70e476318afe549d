//! Statistical predictor trait and the unavailable fallback.
//!
//! The `PredictorBackend` trait abstracts over classifiers that map a
//! symptom presence vector to ranked diagnosis probabilities.
//! Implementations:
//! - `LinearPredictor`: softmax over a linear model (naive-Bayes fitted or loaded)
//! - `CachedPredictor`: memoizing wrapper around any backend
//! - `UnavailablePredictor`: always returns None (case matcher runs alone)

use ndarray::Array1;
use serde::Serialize;
use symptomatch_core::Demographics;

/// One predicted diagnosis with model-native probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f64,
}

/// Trait for statistical predictor backends.
pub trait PredictorBackend: Send + Sync {
    /// Rank diagnoses for a presence vector in vocabulary order.
    /// Returns None if the backend cannot answer.
    fn predict(&self, features: &Array1<f64>, demographics: &Demographics) -> Option<Vec<Prediction>>;

    /// Check if the backend is available (model loaded).
    fn is_available(&self) -> bool;

    /// Short name for logs and attribution.
    fn name(&self) -> &str;
}

/// Placeholder predictor that never answers.
pub struct UnavailablePredictor {
    reason: String,
}

impl UnavailablePredictor {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl PredictorBackend for UnavailablePredictor {
    fn predict(&self, _features: &Array1<f64>, _demographics: &Demographics) -> Option<Vec<Prediction>> {
        None
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
