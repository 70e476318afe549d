//! In-memory case dataset with a per-label index.

use std::collections::BTreeMap;
use symptomatch_core::SymptomKey;

use crate::types::{CaseRecord, LabelInfo, LoadReport};

/// All valid case records plus derived per-label lookups.
///
/// Built once and never mutated; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseDataset {
    records: Vec<CaseRecord>,
    symptom_columns: Vec<SymptomKey>,
    labels: BTreeMap<String, LabelInfo>,
    report: LoadReport,
}

impl CaseDataset {
    /// Build a dataset and its label index. Records with a blank diagnosis
    /// are dropped and counted in the report.
    pub fn new(records: Vec<CaseRecord>, symptom_columns: Vec<SymptomKey>, mut report: LoadReport) -> Self {
        let before = records.len();
        let records: Vec<CaseRecord> = records
            .into_iter()
            .filter(|r| !r.diagnosis.trim().is_empty())
            .collect();
        report.rows_rejected += before - records.len();

        let labels = build_label_index(&records);
        report.labels = labels.len();
        report.symptom_columns = symptom_columns.len();

        Self {
            records,
            symptom_columns,
            labels,
            report,
        }
    }

    /// Build from records alone, deriving symptom columns from the records.
    /// Convenient for tests and programmatic datasets.
    pub fn from_records(records: Vec<CaseRecord>) -> Self {
        let mut columns: Vec<SymptomKey> = records
            .iter()
            .flat_map(|r| r.symptoms.iter().cloned())
            .collect();
        columns.sort();
        columns.dedup();
        let report = LoadReport {
            origin: "<memory>".into(),
            rows_read: records.len(),
            ..Default::default()
        };
        Self::new(records, columns, report)
    }

    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Symptom columns of the source table, in column order.
    pub fn symptom_columns(&self) -> &[SymptomKey] {
        &self.symptom_columns
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Distinct diagnosis labels in lexical order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn label_info(&self, label: &str) -> Option<&LabelInfo> {
        self.labels.get(label)
    }

    /// First record for `label` whose description is non-empty.
    pub fn description_record(&self, label: &str) -> Option<&CaseRecord> {
        self.labels
            .get(label)
            .and_then(|info| info.description_record)
            .map(|i| &self.records[i])
    }
}

fn build_label_index(records: &[CaseRecord]) -> BTreeMap<String, LabelInfo> {
    let mut labels: BTreeMap<String, LabelInfo> = BTreeMap::new();
    let mut durations: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for (i, record) in records.iter().enumerate() {
        let info = labels
            .entry(record.diagnosis.clone())
            .or_insert_with(|| LabelInfo {
                label: record.diagnosis.clone(),
                record_count: 0,
                description_record: None,
                typical_duration_days: None,
            });
        info.record_count += 1;
        if info.description_record.is_none() && !record.description.trim().is_empty() {
            info.description_record = Some(i);
        }
        if let Some(d) = record.duration_days {
            durations.entry(record.diagnosis.as_str()).or_default().push(d);
        }
    }

    for (label, mut values) in durations {
        if let Some(info) = labels.get_mut(label) {
            info.typical_duration_days = median(&mut values);
        }
    }

    labels
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
