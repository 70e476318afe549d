//! Linear softmax classifier over symptom presence vectors.
//!
//! Scores are `bias + W·x`, turned into probabilities with a softmax.
//! A Bernoulli naive Bayes model is exactly such a linear model in log
//! space, so `fit_naive_bayes` produces one directly from the case table.
//! Models round-trip through a JSON artifact.

use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use symptomatch_cases::CaseDataset;
use symptomatch_core::{Demographics, Error, Result, SymptomKey};
use symptomatch_extract::Vocabulary;
use tracing::info;

use crate::predictor::{Prediction, PredictorBackend};

/// Predictions below this probability are dropped.
pub const MIN_PROBABILITY: f64 = 0.01;

/// Serialized form of a [`LinearModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelArtifact {
    symptoms: Vec<SymptomKey>,
    labels: Vec<String>,
    /// One row per label, one column per symptom.
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

/// Fitted linear model.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    symptoms: Vec<SymptomKey>,
    labels: Vec<String>,
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl LinearModel {
    /// Fit a Bernoulli naive Bayes model with Laplace smoothing.
    ///
    /// Features follow vocabulary order; dataset symptoms outside the
    /// vocabulary are ignored.
    pub fn fit_naive_bayes(vocabulary: &Vocabulary, dataset: &CaseDataset) -> Result<Self> {
        let symptoms: Vec<SymptomKey> = vocabulary.keys().cloned().collect();
        let shared = dataset
            .symptom_columns()
            .iter()
            .filter(|k| vocabulary.contains(k))
            .count();
        if shared == 0 {
            return Err(Error::PredictorUnavailable(
                "case table shares no symptom columns with the vocabulary".into(),
            ));
        }

        let labels: Vec<String> = dataset.labels().map(String::from).collect();
        let n_labels = labels.len();
        let n_features = symptoms.len();

        let mut counts = Array2::<f64>::zeros((n_labels, n_features));
        let mut totals = Array1::<f64>::zeros(n_labels);
        for record in dataset.records() {
            let Ok(row) = labels.binary_search(&record.diagnosis) else {
                continue;
            };
            totals[row] += 1.0;
            for key in &record.symptoms {
                if let Some(col) = vocabulary.position(key) {
                    counts[[row, col]] += 1.0;
                }
            }
        }

        let n_total = totals.sum();
        let mut weights = Array2::<f64>::zeros((n_labels, n_features));
        let mut bias = Array1::<f64>::zeros(n_labels);
        for c in 0..n_labels {
            let mut b = (totals[c] / n_total).ln();
            for j in 0..n_features {
                let p = (counts[[c, j]] + 1.0) / (totals[c] + 2.0);
                weights[[c, j]] = p.ln() - (1.0 - p).ln();
                b += (1.0 - p).ln();
            }
            bias[c] = b;
        }

        info!(
            "Fitted naive Bayes predictor: labels={}, features={}, shared_features={}",
            n_labels, n_features, shared
        );

        Ok(Self {
            symptoms,
            labels,
            weights,
            bias,
        })
    }

    /// Load an artifact and check it matches the vocabulary's vector order.
    pub fn load(path: &Path, vocabulary: &Vocabulary) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::ModelArtifact(format!("cannot read {}: {e}", path.display()))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw)
            .map_err(|e| Error::ModelArtifact(format!("{}: {e}", path.display())))?;
        let model = Self::from_artifact(artifact)?;

        if !model.symptoms.iter().eq(vocabulary.keys()) {
            return Err(Error::ModelArtifact(format!(
                "{}: symptom order does not match the vocabulary",
                path.display()
            )));
        }

        info!(
            "Loaded model artifact {} (labels={}, features={})",
            path.display(),
            model.labels.len(),
            model.symptoms.len()
        );
        Ok(model)
    }

    /// Write the model as a JSON artifact.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let artifact = ModelArtifact {
            symptoms: self.symptoms.clone(),
            labels: self.labels.clone(),
            weights: self.weights.rows().into_iter().map(|r| r.to_vec()).collect(),
            bias: self.bias.to_vec(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&artifact)?)?;
        info!("Saved model artifact to {}", path.display());
        Ok(())
    }

    fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        let n_labels = artifact.labels.len();
        let n_features = artifact.symptoms.len();
        if n_labels == 0 || n_features == 0 {
            return Err(Error::ModelArtifact("artifact has no labels or no symptoms".into()));
        }
        if artifact.bias.len() != n_labels || artifact.weights.len() != n_labels {
            return Err(Error::ModelArtifact(format!(
                "expected {n_labels} weight rows and bias terms"
            )));
        }
        if artifact.weights.iter().any(|row| row.len() != n_features) {
            return Err(Error::ModelArtifact(format!(
                "every weight row must have {n_features} columns"
            )));
        }

        let flat: Vec<f64> = artifact.weights.into_iter().flatten().collect();
        if flat.iter().chain(artifact.bias.iter()).any(|v| !v.is_finite()) {
            return Err(Error::ModelArtifact("non-finite parameter".into()));
        }
        let weights = Array2::from_shape_vec((n_labels, n_features), flat)
            .map_err(|e| Error::ModelArtifact(e.to_string()))?;

        Ok(Self {
            symptoms: artifact.symptoms,
            labels: artifact.labels,
            weights,
            bias: Array1::from(artifact.bias),
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn feature_count(&self) -> usize {
        self.symptoms.len()
    }

    /// Softmax probabilities per label, or None on a shape mismatch.
    pub fn probabilities(&self, features: &Array1<f64>) -> Option<Array1<f64>> {
        if features.len() != self.symptoms.len() {
            return None;
        }
        let scores = self.weights.dot(features) + &self.bias;
        let max = scores.fold(f64::NEG_INFINITY, |m, &s| m.max(s));
        let exp = scores.mapv(|s| (s - max).exp());
        let total = exp.sum();
        Some(exp / total)
    }
}

/// Backend that answers from a [`LinearModel`].
pub struct LinearPredictor {
    model: LinearModel,
    name: String,
}

impl LinearPredictor {
    pub fn new(model: LinearModel, name: impl Into<String>) -> Self {
        Self {
            model,
            name: name.into(),
        }
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }
}

impl PredictorBackend for LinearPredictor {
    /// Demographics are accepted for interface parity; the linear model is
    /// fitted on symptoms only.
    fn predict(&self, features: &Array1<f64>, _demographics: &Demographics) -> Option<Vec<Prediction>> {
        if features.iter().all(|&v| v == 0.0) {
            return Some(Vec::new());
        }
        let probs = self.model.probabilities(features)?;

        let mut predictions: Vec<Prediction> = self
            .model
            .labels
            .iter()
            .zip(probs.iter())
            .filter(|(_, p)| **p >= MIN_PROBABILITY)
            .map(|(label, &p)| Prediction {
                label: label.clone(),
                probability: p,
            })
            .collect();
        predictions.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });
        Some(predictions)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }
}
