//! Candidate, severity, and combination types.

use serde::Serialize;
use symptomatch_core::SymptomSet;

/// Which kind of evidence source proposed a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Set similarity against historical case records.
    CaseMatch,
    /// Statistical classifier over the symptom vector.
    Statistical,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CaseMatch => write!(f, "case_match"),
            Self::Statistical => write!(f, "statistical"),
        }
    }
}

/// One proposed diagnosis from a single source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateDiagnosis {
    pub label: String,
    /// Source-native evidence strength in [0, 1]: best record similarity
    /// for the case matcher, class probability for the predictor.
    pub similarity: f64,
    /// User-facing confidence in [0, 1].
    pub confidence: f64,
    pub matched_symptoms: SymptomSet,
    /// Records whose similarity cleared the support floor.
    pub supporting_records: usize,
}

/// Severity tag assigned from combined confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

impl Severity {
    pub const HIGH_THRESHOLD: f64 = 0.70;
    pub const MODERATE_THRESHOLD: f64 = 0.40;

    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= Self::HIGH_THRESHOLD {
            Self::High
        } else if confidence >= Self::MODERATE_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Moderate => write!(f, "moderate"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Overall outcome of a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisStatus {
    /// At least one candidate survived combination.
    Matched,
    /// No source proposed anything; render a "no strong match" message.
    InsufficientEvidence,
}

/// A diagnosis after merging all sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedCandidate {
    pub label: String,
    pub confidence: f64,
    pub severity: Severity,
    /// Union of matched symptoms across sources.
    pub matched_symptoms: SymptomSet,
    pub supporting_records: usize,
    /// Sources that proposed this label, in source order.
    pub sources: Vec<SourceKind>,
}

/// Combiner output: ranked candidates plus attribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Combination {
    pub status: DiagnosisStatus,
    pub candidates: Vec<CombinedCandidate>,
    /// Sources behind the top-ranked label. Empty when nothing matched.
    pub methods: Vec<SourceKind>,
    /// Sources that could not answer this request.
    pub unavailable_sources: Vec<SourceKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(Severity::from_confidence(0.0), Severity::Low);
        assert_eq!(Severity::from_confidence(0.39), Severity::Low);
        assert_eq!(Severity::from_confidence(0.40), Severity::Moderate);
        assert_eq!(Severity::from_confidence(0.69), Severity::Moderate);
        assert_eq!(Severity::from_confidence(0.70), Severity::High);
        assert_eq!(Severity::from_confidence(1.0), Severity::High);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_value(SourceKind::CaseMatch).unwrap(), "case_match");
        assert_eq!(serde_json::to_value(Severity::Moderate).unwrap(), "moderate");
        assert_eq!(
            serde_json::to_value(DiagnosisStatus::InsufficientEvidence).unwrap(),
            "insufficient_evidence"
        );
    }
}
