//! Final result types returned to callers.

use serde::Serialize;
use std::collections::BTreeMap;
use symptomatch_core::{Demographics, SymptomKey, SymptomSet};
use symptomatch_resolve::{DiagnosisStatus, Severity, SourceKind};

/// One ranked diagnosis with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisEntry {
    pub diagnosis: String,
    /// Combined confidence in [0, 1].
    pub confidence: f64,
    /// `confidence` as a percentage, one decimal.
    #[serde(rename = "confidencePercent")]
    pub confidence_percent: f64,
    pub severity: Severity,
    pub description: String,
    #[serde(rename = "recommendedAction")]
    pub recommended_action: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub medications: Vec<String>,
    #[serde(rename = "typicalDurationDays", skip_serializing_if = "Option::is_none")]
    pub typical_duration_days: Option<f64>,
    #[serde(rename = "matchedSymptoms")]
    pub matched_symptoms: SymptomSet,
    #[serde(rename = "supportingRecords")]
    pub supporting_records: usize,
    pub sources: Vec<SourceKind>,
}

/// Ranked differential diagnosis for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferentialResult {
    pub status: DiagnosisStatus,
    pub diagnoses: Vec<DiagnosisEntry>,
    /// Symptoms extracted from the input, for transparency.
    pub symptoms: SymptomSet,
    /// Phrases that triggered each extracted symptom.
    pub triggers: BTreeMap<SymptomKey, Vec<String>>,
    #[serde(rename = "negatedSymptoms", skip_serializing_if = "SymptomSet::is_empty")]
    pub negated_symptoms: SymptomSet,
    pub demographics: Demographics,
    /// Sources behind the top-ranked diagnosis.
    pub methods: Vec<SourceKind>,
    /// Sources that could not answer; results were computed without them.
    #[serde(rename = "unavailableSources")]
    pub unavailable_sources: Vec<SourceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DifferentialResult {
    pub fn is_match(&self) -> bool {
        self.status == DiagnosisStatus::Matched
    }

    pub fn top(&self) -> Option<&DiagnosisEntry> {
        self.diagnoses.first()
    }
}
