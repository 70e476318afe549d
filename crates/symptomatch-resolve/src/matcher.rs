//! Case matcher: set similarity against every historical case record.

use std::collections::BTreeMap;
use std::sync::Arc;

use symptomatch_cases::CaseDataset;
use symptomatch_core::{DemographicPolicy, EngineConfig, SimilarityMetric, SymptomKey, SymptomSet};
use symptomatch_extract::Vocabulary;
use tracing::debug;

use crate::source::{EvidenceQuery, EvidenceSource, SourceOutcome};
use crate::types::{CandidateDiagnosis, SourceKind};

/// Exponent of the similarity-to-confidence curve.
pub const CONFIDENCE_EXPONENT: f64 = 1.5;

/// `|a ∩ b| / |a ∪ b|`. Zero when both sets are empty.
pub fn jaccard(a: &SymptomSet, b: &SymptomSet) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Jaccard with each key counted by its weight instead of 1.
pub fn weighted_jaccard(a: &SymptomSet, b: &SymptomSet, weight: impl Fn(&SymptomKey) -> f64) -> f64 {
    let union: f64 = a.union(b).map(&weight).sum();
    if union <= 0.0 {
        return 0.0;
    }
    a.intersection(b).map(&weight).sum::<f64>() / union
}

/// Map a similarity in [0, 1] to user-facing confidence: `s^1.5`.
///
/// Monotone, so rankings are unchanged. Penalizes weak overlap: 0.2 reads
/// as 0.09, 0.5 as 0.35, while a perfect match stays 1.0.
pub fn scale_confidence(similarity: f64) -> f64 {
    similarity.clamp(0.0, 1.0).powf(CONFIDENCE_EXPONENT)
}

/// Matcher tuning, usually taken from [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub top_n: usize,
    pub support_floor: f64,
    pub metric: SimilarityMetric,
    pub demographic_policy: DemographicPolicy,
    pub demographic_penalty: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for MatcherConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            top_n: config.top_n,
            support_floor: config.support_floor,
            metric: config.similarity,
            demographic_policy: config.demographic_policy,
            demographic_penalty: config.demographic_penalty,
        }
    }
}

/// Per-label accumulator.
struct LabelScore<'a> {
    best: f64,
    best_symptoms: &'a SymptomSet,
    support: usize,
}

/// Scores every case record against the query and aggregates by label.
pub struct CaseMatcher {
    dataset: Arc<CaseDataset>,
    vocabulary: Arc<Vocabulary>,
    config: MatcherConfig,
}

impl CaseMatcher {
    pub fn new(dataset: Arc<CaseDataset>, vocabulary: Arc<Vocabulary>, config: MatcherConfig) -> Self {
        Self {
            dataset,
            vocabulary,
            config,
        }
    }

    fn similarity(&self, query: &SymptomSet, record: &SymptomSet) -> f64 {
        match self.config.metric {
            SimilarityMetric::Jaccard => jaccard(query, record),
            SimilarityMetric::WeightedJaccard => {
                weighted_jaccard(query, record, |k| self.vocabulary.weight(k))
            }
        }
    }

    /// Ranked candidates for a query, at most `top_n`. Empty for an empty query.
    ///
    /// A label scores the maximum over its records; ties break by supporting
    /// record count, then label.
    pub fn rank(&self, query: &EvidenceQuery<'_>) -> Vec<CandidateDiagnosis> {
        if query.symptoms.is_empty() {
            return Vec::new();
        }

        let mut by_label: BTreeMap<&str, LabelScore<'_>> = BTreeMap::new();
        let mut excluded = 0usize;

        for record in self.dataset.records() {
            let mismatches = query.demographics.mismatches(&record.demographics);
            let factor = match self.config.demographic_policy {
                DemographicPolicy::Ignore => 1.0,
                DemographicPolicy::Soften => self.config.demographic_penalty.powi(mismatches as i32),
                DemographicPolicy::Exclude if mismatches > 0 => {
                    excluded += 1;
                    continue;
                }
                DemographicPolicy::Exclude => 1.0,
            };

            let score = self.similarity(query.symptoms, &record.symptoms) * factor;
            if score <= 0.0 {
                continue;
            }

            let entry = by_label.entry(record.diagnosis.as_str()).or_insert(LabelScore {
                best: 0.0,
                best_symptoms: &record.symptoms,
                support: 0,
            });
            if score > entry.best {
                entry.best = score;
                entry.best_symptoms = &record.symptoms;
            }
            if score >= self.config.support_floor {
                entry.support += 1;
            }
        }

        let mut candidates: Vec<CandidateDiagnosis> = by_label
            .into_iter()
            .map(|(label, s)| CandidateDiagnosis {
                label: label.to_string(),
                similarity: s.best,
                confidence: scale_confidence(s.best),
                matched_symptoms: query.symptoms.intersection(s.best_symptoms).cloned().collect(),
                supporting_records: s.support,
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.supporting_records.cmp(&a.supporting_records))
                .then_with(|| a.label.cmp(&b.label))
        });
        candidates.truncate(self.config.top_n);

        debug!(
            "Case matcher: query={} candidates={} excluded_by_demographics={}",
            query.symptoms.signature(),
            candidates.len(),
            excluded
        );
        candidates
    }
}

impl EvidenceSource for CaseMatcher {
    fn kind(&self) -> SourceKind {
        SourceKind::CaseMatch
    }

    fn propose(&self, query: &EvidenceQuery<'_>) -> SourceOutcome {
        SourceOutcome::Candidates(self.rank(query))
    }
}
