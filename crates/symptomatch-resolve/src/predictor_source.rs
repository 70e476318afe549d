//! Adapter exposing a statistical predictor as an evidence source.

use std::sync::Arc;

use ndarray::Array1;
use symptomatch_core::SymptomSet;
use symptomatch_extract::Vocabulary;
use symptomatch_infer::PredictorBackend;
use tracing::debug;

use crate::source::{EvidenceQuery, EvidenceSource, SourceOutcome};
use crate::types::{CandidateDiagnosis, SourceKind};

pub struct PredictorSource {
    backend: Arc<dyn PredictorBackend>,
    vocabulary: Arc<Vocabulary>,
    top_n: usize,
}

impl PredictorSource {
    pub fn new(backend: Arc<dyn PredictorBackend>, vocabulary: Arc<Vocabulary>, top_n: usize) -> Self {
        Self {
            backend,
            vocabulary,
            top_n,
        }
    }
}

impl EvidenceSource for PredictorSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Statistical
    }

    fn propose(&self, query: &EvidenceQuery<'_>) -> SourceOutcome {
        if !self.backend.is_available() {
            return SourceOutcome::Unavailable(format!("{} predictor not loaded", self.backend.name()));
        }
        if query.symptoms.is_empty() {
            return SourceOutcome::Candidates(Vec::new());
        }

        let presence = self.vocabulary.presence_vector(query.symptoms);
        let features = Array1::from(presence.into_iter().map(f64::from).collect::<Vec<_>>());
        let used: SymptomSet = query
            .symptoms
            .iter()
            .filter(|k| self.vocabulary.contains(k))
            .cloned()
            .collect();

        let Some(predictions) = self.backend.predict(&features, query.demographics) else {
            debug!("Predictor {} returned no answer", self.backend.name());
            return SourceOutcome::Unavailable(format!("{} predictor gave no answer", self.backend.name()));
        };

        let candidates = predictions
            .into_iter()
            .take(self.top_n)
            .map(|p| CandidateDiagnosis {
                label: p.label,
                similarity: p.probability,
                confidence: p.probability.clamp(0.0, 1.0),
                matched_symptoms: used.clone(),
                supporting_records: 0,
            })
            .collect();
        SourceOutcome::Candidates(candidates)
    }
}
