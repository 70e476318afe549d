//! Response assembler: attaches descriptive text to ranked diagnoses.
//!
//! Performs no ranking. Text comes from the dataset's label index; labels
//! without a described record get fixed placeholders.

use std::sync::Arc;

use symptomatch_cases::CaseDataset;
use symptomatch_core::Demographics;
use symptomatch_extract::Extraction;
use symptomatch_resolve::{Combination, DiagnosisStatus};

use crate::types::{DiagnosisEntry, DifferentialResult};

pub const GENERIC_DESCRIPTION: &str = "No description available for this condition.";
pub const GENERIC_ACTION: &str = "Consult a healthcare professional for further evaluation.";
pub const NO_MATCH_MESSAGE: &str =
    "No strong match found for the described symptoms. Try describing them in more detail, or consult a healthcare professional.";

pub struct ResponseAssembler {
    dataset: Arc<CaseDataset>,
}

impl ResponseAssembler {
    pub fn new(dataset: Arc<CaseDataset>) -> Self {
        Self { dataset }
    }

    pub fn assemble(
        &self,
        combination: Combination,
        extraction: Extraction,
        demographics: Demographics,
    ) -> DifferentialResult {
        let diagnoses: Vec<DiagnosisEntry> = combination
            .candidates
            .into_iter()
            .map(|c| {
                let record = self.dataset.description_record(&c.label);
                let description = record
                    .map(|r| r.description.clone())
                    .unwrap_or_else(|| GENERIC_DESCRIPTION.to_string());
                let recommended_action = record
                    .map(|r| r.recommended_action.clone())
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_ACTION.to_string());
                let medications = record.map(|r| r.medications.clone()).unwrap_or_default();
                let typical_duration_days = self
                    .dataset
                    .label_info(&c.label)
                    .and_then(|info| info.typical_duration_days);

                DiagnosisEntry {
                    confidence_percent: (c.confidence * 1000.0).round() / 10.0,
                    diagnosis: c.label,
                    confidence: c.confidence,
                    severity: c.severity,
                    description,
                    recommended_action,
                    medications,
                    typical_duration_days,
                    matched_symptoms: c.matched_symptoms,
                    supporting_records: c.supporting_records,
                    sources: c.sources,
                }
            })
            .collect();

        let message = match combination.status {
            DiagnosisStatus::InsufficientEvidence => Some(NO_MATCH_MESSAGE.to_string()),
            DiagnosisStatus::Matched => None,
        };

        DifferentialResult {
            status: combination.status,
            diagnoses,
            symptoms: extraction.symptoms,
            triggers: extraction.triggers,
            negated_symptoms: extraction.negated,
            demographics,
            methods: combination.methods,
            unavailable_sources: combination.unavailable_sources,
            message,
        }
    }
}
