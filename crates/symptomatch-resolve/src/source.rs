//! The evidence-source strategy interface.

use symptomatch_core::{Demographics, SymptomSet};

use crate::types::{CandidateDiagnosis, SourceKind};

/// Input shared by every source for one request.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceQuery<'a> {
    pub symptoms: &'a SymptomSet,
    pub demographics: &'a Demographics,
}

/// What a source returned for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// Ranked candidates, best first. May be empty ("no evidence").
    Candidates(Vec<CandidateDiagnosis>),
    /// The source could not answer; the reason is for logs only.
    Unavailable(String),
}

impl SourceOutcome {
    /// Candidates if the source answered, else an empty slice.
    pub fn candidates(&self) -> &[CandidateDiagnosis] {
        match self {
            Self::Candidates(c) => c,
            Self::Unavailable(_) => &[],
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// A source's outcome tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutput {
    pub kind: SourceKind,
    pub outcome: SourceOutcome,
}

/// Any component that proposes ranked diagnoses from a symptom set.
pub trait EvidenceSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Propose candidates for the query. Must not panic on any input.
    fn propose(&self, query: &EvidenceQuery<'_>) -> SourceOutcome;
}
