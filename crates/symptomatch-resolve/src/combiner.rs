//! Result combiner: merges evidence-source outputs into one ranking.
//!
//! Policy, fixed and source-agnostic:
//! - each source kind gets a weight; the case matcher's grows with the
//!   number of extracted symptoms, the predictor takes the remainder
//! - a label proposed by several sources gets their weighted mean
//! - a label missing from some other source that did propose candidates is
//!   discounted; sources that were empty or unavailable do not discount
//! - severity comes from fixed confidence thresholds

use std::collections::BTreeMap;

use symptomatch_core::{CombineWeights, EngineConfig, SymptomSet};
use tracing::debug;

use crate::source::SourceOutput;
use crate::types::{CombinedCandidate, Combination, DiagnosisStatus, Severity, SourceKind};

pub struct ResultCombiner {
    weights: CombineWeights,
    top_n: usize,
}

/// Per-label accumulator across sources.
struct Merge {
    /// (source weight, source confidence) per contributing source.
    contributions: Vec<(f64, f64)>,
    matched: SymptomSet,
    support: usize,
    sources: Vec<SourceKind>,
}

impl ResultCombiner {
    pub fn new(weights: CombineWeights, top_n: usize) -> Self {
        Self { weights, top_n }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.combine, config.top_n)
    }

    fn weight_for(&self, kind: SourceKind, symptom_count: usize) -> f64 {
        let matcher = self.weights.matcher_weight(symptom_count);
        match kind {
            SourceKind::CaseMatch => matcher,
            SourceKind::Statistical => 1.0 - matcher,
        }
    }

    /// Merge source outputs for a query with `symptom_count` extracted symptoms.
    pub fn combine(&self, outputs: &[SourceOutput], symptom_count: usize) -> Combination {
        let unavailable_sources: Vec<SourceKind> = outputs
            .iter()
            .filter(|o| o.outcome.is_unavailable())
            .map(|o| o.kind)
            .collect();
        let contributing: Vec<SourceKind> = outputs
            .iter()
            .filter(|o| !o.outcome.candidates().is_empty())
            .map(|o| o.kind)
            .collect();

        let mut merged: BTreeMap<&str, Merge> = BTreeMap::new();
        for output in outputs {
            let weight = self.weight_for(output.kind, symptom_count);
            for candidate in output.outcome.candidates() {
                let entry = merged.entry(candidate.label.as_str()).or_insert_with(|| Merge {
                    contributions: Vec::new(),
                    matched: SymptomSet::new(),
                    support: 0,
                    sources: Vec::new(),
                });
                if entry.sources.contains(&output.kind) {
                    // A source proposing the same label twice counts once.
                    continue;
                }
                entry.contributions.push((weight, candidate.confidence));
                for key in &candidate.matched_symptoms {
                    entry.matched.insert(key.clone());
                }
                entry.support = entry.support.max(candidate.supporting_records);
                entry.sources.push(output.kind);
            }
        }

        let mut candidates: Vec<CombinedCandidate> = merged
            .into_iter()
            .map(|(label, m)| {
                let mean = weighted_mean(&m.contributions);
                let single_source = m.sources.len() < contributing.len();
                let confidence = if single_source {
                    mean * self.weights.single_source_discount
                } else {
                    mean
                }
                .clamp(0.0, 1.0);
                CombinedCandidate {
                    label: label.to_string(),
                    confidence,
                    severity: Severity::from_confidence(confidence),
                    matched_symptoms: m.matched,
                    supporting_records: m.support,
                    sources: m.sources,
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.supporting_records.cmp(&a.supporting_records))
                .then_with(|| a.label.cmp(&b.label))
        });
        candidates.truncate(self.top_n);

        let (status, methods) = match candidates.first() {
            Some(top) => (DiagnosisStatus::Matched, top.sources.clone()),
            None => (DiagnosisStatus::InsufficientEvidence, Vec::new()),
        };

        debug!(
            "Combined {} sources: candidates={} status={:?} unavailable={:?}",
            outputs.len(),
            candidates.len(),
            status,
            unavailable_sources
        );

        Combination {
            status,
            candidates,
            methods,
            unavailable_sources,
        }
    }
}

/// Weighted mean of source confidences. A lone source passes through
/// untouched; all-zero weights fall back to the plain mean.
fn weighted_mean(contributions: &[(f64, f64)]) -> f64 {
    match contributions {
        [] => 0.0,
        [(_, confidence)] => *confidence,
        _ => {
            let total: f64 = contributions.iter().map(|(w, _)| w).sum();
            if total > 0.0 {
                contributions.iter().map(|(w, c)| w * c).sum::<f64>() / total
            } else {
                contributions.iter().map(|(_, c)| c).sum::<f64>() / contributions.len() as f64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceOutcome;
    use crate::types::CandidateDiagnosis;

    fn candidate(label: &str, confidence: f64, support: usize) -> CandidateDiagnosis {
        CandidateDiagnosis {
            label: label.into(),
            similarity: confidence,
            confidence,
            matched_symptoms: ["fever"].into_iter().collect(),
            supporting_records: support,
        }
    }

    fn output(kind: SourceKind, candidates: Vec<CandidateDiagnosis>) -> SourceOutput {
        SourceOutput {
            kind,
            outcome: SourceOutcome::Candidates(candidates),
        }
    }

    fn combiner() -> ResultCombiner {
        ResultCombiner::new(CombineWeights::default(), 5)
    }

    #[test]
    fn test_empty_predictor_is_identity() {
        let matcher = vec![
            candidate("Flu", 0.9, 3),
            candidate("Cold", 0.5, 2),
            candidate("Croup", 0.5, 1),
        ];
        let result = combiner().combine(
            &[
                output(SourceKind::CaseMatch, matcher.clone()),
                output(SourceKind::Statistical, Vec::new()),
            ],
            2,
        );
        let labels: Vec<&str> = result.candidates.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Flu", "Cold", "Croup"]);
        for (combined, original) in result.candidates.iter().zip(&matcher) {
            assert_eq!(combined.confidence, original.confidence);
        }
        assert_eq!(result.methods, vec![SourceKind::CaseMatch]);
        assert!(result.unavailable_sources.is_empty());
    }

    #[test]
    fn test_unavailable_predictor_recorded() {
        let result = combiner().combine(
            &[
                output(SourceKind::CaseMatch, vec![candidate("Flu", 0.8, 1)]),
                SourceOutput {
                    kind: SourceKind::Statistical,
                    outcome: SourceOutcome::Unavailable("not loaded".into()),
                },
            ],
            1,
        );
        assert_eq!(result.status, DiagnosisStatus::Matched);
        assert_eq!(result.candidates[0].confidence, 0.8);
        assert_eq!(result.unavailable_sources, vec![SourceKind::Statistical]);
    }

    #[test]
    fn test_both_sources_weighted_mean() {
        // 3 symptoms: matcher weight 0.7, predictor 0.3.
        let result = combiner().combine(
            &[
                output(SourceKind::CaseMatch, vec![candidate("Flu", 1.0, 2)]),
                output(SourceKind::Statistical, vec![candidate("Flu", 0.5, 0)]),
            ],
            3,
        );
        let flu = &result.candidates[0];
        assert!((flu.confidence - 0.85).abs() < 1e-12);
        assert_eq!(flu.severity, Severity::High);
        assert_eq!(flu.supporting_records, 2);
        assert_eq!(result.methods, vec![SourceKind::CaseMatch, SourceKind::Statistical]);
    }

    #[test]
    fn test_single_source_label_discounted() {
        let result = combiner().combine(
            &[
                output(SourceKind::CaseMatch, vec![candidate("Flu", 0.6, 1)]),
                output(SourceKind::Statistical, vec![candidate("Cold", 0.6, 0)]),
            ],
            1,
        );
        assert_eq!(result.candidates.len(), 2);
        for c in &result.candidates {
            assert!((c.confidence - 0.51).abs() < 1e-12);
        }
        // Equal confidence: more support wins.
        assert_eq!(result.candidates[0].label, "Flu");
        assert_eq!(result.methods, vec![SourceKind::CaseMatch]);
    }

    #[test]
    fn test_agreement_outranks_single_source() {
        let result = combiner().combine(
            &[
                output(
                    SourceKind::CaseMatch,
                    vec![candidate("Flu", 0.7, 1), candidate("Cold", 0.7, 1)],
                ),
                output(SourceKind::Statistical, vec![candidate("Cold", 0.7, 0)]),
            ],
            2,
        );
        assert_eq!(result.candidates[0].label, "Cold");
        assert_eq!(result.methods.len(), 2);
    }

    #[test]
    fn test_nothing_proposed_is_insufficient_evidence() {
        let result = combiner().combine(
            &[
                output(SourceKind::CaseMatch, Vec::new()),
                output(SourceKind::Statistical, Vec::new()),
            ],
            0,
        );
        assert_eq!(result.status, DiagnosisStatus::InsufficientEvidence);
        assert!(result.candidates.is_empty());
        assert!(result.methods.is_empty());
    }

    #[test]
    fn test_top_n_cap() {
        let many: Vec<CandidateDiagnosis> = (0..8)
            .map(|i| candidate(&format!("D{i}"), 0.1 * i as f64, 1))
            .collect();
        let result = ResultCombiner::new(CombineWeights::default(), 3)
            .combine(&[output(SourceKind::CaseMatch, many)], 2);
        assert_eq!(result.candidates.len(), 3);
        assert_eq!(result.candidates[0].label, "D7");
        assert!(result
            .candidates
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
    }
}
