//! Case record and load report types.

use serde::Serialize;
use symptomatch_core::{Demographics, SymptomSet};

/// One historical observation: a symptom set and the diagnosis it led to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRecord {
    /// Diagnosis label, trimmed and never empty. Not unique across records.
    pub diagnosis: String,
    pub symptoms: SymptomSet,
    pub demographics: Demographics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<f64>,
    pub description: String,
    pub recommended_action: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub medications: Vec<String>,
}

/// Per-label facts derived once at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelInfo {
    pub label: String,
    pub record_count: usize,
    /// Index of the first record for this label with a non-empty description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_record: Option<usize>,
    /// Median `duration_days` over this label's records that carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typical_duration_days: Option<f64>,
}

/// Summary of a load, kept alongside the dataset for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Source the records came from (file path or `"<memory>"`).
    pub origin: String,
    #[serde(rename = "rowsRead")]
    pub rows_read: usize,
    /// Rows dropped because their diagnosis was empty or whitespace.
    #[serde(rename = "rowsRejected")]
    pub rows_rejected: usize,
    #[serde(rename = "symptomColumns")]
    pub symptom_columns: usize,
    pub labels: usize,
}
