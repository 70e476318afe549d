//! CSV case-table loader.
//!
//! Expected shape: one row per case, one column per canonical symptom key
//! holding a presence marker, plus the descriptive columns below.
//!
//! ```text
//! diagnosis,diagnosis_description,recommended_action,age_group,duration_days,headache,fever
//! Migraine,Recurrent headaches,Rest in a dark room,adult,2,1,0
//! ```

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use symptomatch_core::{Demographics, Error, Result, SymptomKey, SymptomSet};
use tracing::{debug, info, warn};

use crate::dataset::CaseDataset;
use crate::types::{CaseRecord, LoadReport};

pub const DIAGNOSIS: &str = "diagnosis";
pub const DESCRIPTION: &str = "diagnosis_description";
pub const ACTION: &str = "recommended_action";
pub const AGE_GROUP: &str = "age_group";
pub const GENDER: &str = "gender";
pub const DURATION: &str = "duration_days";
pub const MEDICATIONS: &str = "medications";

/// Columns the case table must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[DIAGNOSIS, DESCRIPTION, ACTION];

/// Non-symptom columns the loader understands.
const KNOWN_COLUMNS: &[&str] = &[DIAGNOSIS, DESCRIPTION, ACTION, AGE_GROUP, GENDER, DURATION, MEDICATIONS];

/// Whether a raw cell marks a symptom as present: the literal `1` or any
/// number equal to one (`1.0`, ` 1 `). Everything else is absent.
pub fn is_truthy(cell: &str) -> bool {
    let cell = cell.trim();
    cell == "1" || cell.parse::<f64>().map(|v| v == 1.0).unwrap_or(false)
}

/// Column positions resolved from the header row.
struct Layout {
    diagnosis: usize,
    description: usize,
    action: usize,
    age_group: Option<usize>,
    gender: Option<usize>,
    duration: Option<usize>,
    medications: Option<usize>,
    symptoms: Vec<(usize, SymptomKey)>,
}

impl Layout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        let mut seen = HashSet::new();
        for name in &names {
            if name.is_empty() {
                return Err(Error::DatasetFormat("header contains an empty column name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::DatasetFormat(format!("duplicate column '{name}'")));
            }
        }

        let find = |col: &str| names.iter().position(|n| n == col);
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| find(col).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::DatasetFormat(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        let require = |col: &str| {
            find(col).ok_or_else(|| Error::DatasetFormat(format!("missing required column '{col}'")))
        };

        let symptoms: Vec<(usize, SymptomKey)> = names
            .iter()
            .enumerate()
            .filter(|(_, n)| !KNOWN_COLUMNS.contains(&n.as_str()))
            .map(|(i, n)| (i, SymptomKey::new(n)))
            .collect();
        if symptoms.is_empty() {
            return Err(Error::DatasetFormat("no symptom columns in header".into()));
        }

        Ok(Self {
            diagnosis: require(DIAGNOSIS)?,
            description: require(DESCRIPTION)?,
            action: require(ACTION)?,
            age_group: find(AGE_GROUP),
            gender: find(GENDER),
            duration: find(DURATION),
            medications: find(MEDICATIONS),
            symptoms,
        })
    }
}

/// Reads a case table into a [`CaseDataset`].
pub struct CaseLoader;

impl CaseLoader {
    /// Load from a CSV file. A missing or unreadable file is fatal.
    pub fn load_file(path: &Path) -> Result<CaseDataset> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::DatasetMissing(format!("cannot open {}: {e}", path.display()))
        })?;
        Self::load_reader(std::io::BufReader::new(file), &path.display().to_string())
    }

    /// Load from any reader. `origin` names the source in logs and the report.
    pub fn load_reader<R: Read>(reader: R, origin: &str) -> Result<CaseDataset> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::None)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| Error::DatasetFormat(format!("{origin}: unreadable header: {e}")))?
            .clone();
        let layout = Layout::from_headers(&headers)
            .map_err(|e| Error::DatasetFormat(format!("{origin}: {e}")))?;

        let mut records = Vec::new();
        let mut report = LoadReport {
            origin: origin.to_string(),
            symptom_columns: layout.symptoms.len(),
            ..Default::default()
        };

        for (row_idx, result) in csv_reader.records().enumerate() {
            let row = result
                .map_err(|e| Error::DatasetFormat(format!("{origin}: row {}: {e}", row_idx + 1)))?;
            report.rows_read += 1;

            match parse_row(&row, &layout) {
                Some(record) => records.push(record),
                None => {
                    debug!("{origin}: row {} rejected (empty diagnosis)", row_idx + 1);
                    report.rows_rejected += 1;
                }
            }
        }

        if records.is_empty() {
            return Err(Error::EmptyDataset(format!(
                "{origin}: {} rows read, {} rejected",
                report.rows_read, report.rows_rejected
            )));
        }
        if report.rows_rejected > 0 {
            warn!(
                "{origin}: rejected {} of {} rows with empty diagnosis",
                report.rows_rejected, report.rows_read
            );
        }

        let symptom_columns = layout.symptoms.into_iter().map(|(_, k)| k).collect();
        let dataset = CaseDataset::new(records, symptom_columns, report);
        info!(
            "Loaded case dataset from {}: records={}, labels={}, symptom_columns={}",
            origin,
            dataset.len(),
            dataset.report().labels,
            dataset.report().symptom_columns
        );
        Ok(dataset)
    }
}

/// Build one record, or `None` when the diagnosis is blank.
fn parse_row(row: &csv::StringRecord, layout: &Layout) -> Option<CaseRecord> {
    let cell = |i: usize| row.get(i).unwrap_or("").trim();
    let optional = |i: Option<usize>| i.map(cell).filter(|s| !s.is_empty());

    let diagnosis = cell(layout.diagnosis);
    if diagnosis.is_empty() {
        return None;
    }

    let symptoms: SymptomSet = layout
        .symptoms
        .iter()
        .filter(|(i, _)| is_truthy(cell(*i)))
        .map(|(_, key)| key.clone())
        .collect();

    let duration_days = optional(layout.duration)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    let medications = optional(layout.medications)
        .map(|s| {
            s.split(';')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Some(CaseRecord {
        diagnosis: diagnosis.to_string(),
        symptoms,
        demographics: Demographics::new(optional(layout.age_group), optional(layout.gender)),
        duration_days,
        description: cell(layout.description).to_string(),
        recommended_action: cell(layout.action).to_string(),
        medications,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
diagnosis,diagnosis_description,recommended_action,age_group,duration_days,medications,Headache,dizziness,fever,cough
Migraine,Recurring headaches,Rest in a dark room,adult,2,ibuprofen; sumatriptan,1,1,0,0
Flu,Viral infection,Rest and fluids,,5,,0,0,1,1.0
  ,Orphan row,None,adult,1,,1,0,0,0
Flu,,,child,abc,,0,0,1,yes
";

    fn load(table: &str) -> Result<CaseDataset> {
        CaseLoader::load_reader(table.as_bytes(), "<memory>")
    }

    #[test]
    fn test_truthy_markers() {
        assert!(is_truthy("1"));
        assert!(is_truthy(" 1 "));
        assert!(is_truthy("1.0"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("yes"));
        assert!(!is_truthy("true"));
        assert!(!is_truthy("2"));
    }

    #[test]
    fn test_load_basic_table() {
        let dataset = load(TABLE).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.report().rows_read, 4);
        assert_eq!(dataset.report().rows_rejected, 1);
        assert_eq!(dataset.report().symptom_columns, 4);

        let migraine = &dataset.records()[0];
        assert_eq!(migraine.diagnosis, "Migraine");
        assert_eq!(migraine.symptoms.signature(), "dizziness,headache");
        assert_eq!(migraine.demographics.age_group, "adult");
        assert_eq!(migraine.demographics.gender, "unknown");
        assert_eq!(migraine.duration_days, Some(2.0));
        assert_eq!(migraine.medications, vec!["ibuprofen", "sumatriptan"]);
    }

    #[test]
    fn test_numeric_and_string_markers_agree() {
        let dataset = load(TABLE).unwrap();
        let flu = &dataset.records()[1];
        assert_eq!(flu.symptoms.signature(), "cough,fever");
        assert_eq!(flu.demographics.age_group, "unknown");

        // "yes" is not a presence marker; unparseable duration is dropped.
        let second_flu = &dataset.records()[2];
        assert_eq!(second_flu.symptoms.signature(), "fever");
        assert_eq!(second_flu.duration_days, None);
    }

    #[test]
    fn test_missing_required_column() {
        let err = load("diagnosis,recommended_action,fever\nFlu,Rest,1\n").unwrap_err();
        assert!(matches!(err, Error::DatasetFormat(_)));
    }

    #[test]
    fn test_every_missing_required_column_reported() {
        let err = load("fever,cough\n1,0\n").unwrap_err();
        let Error::DatasetFormat(message) = &err else {
            panic!("expected a format error, got {err:?}");
        };
        for col in REQUIRED_COLUMNS {
            assert!(message.contains(*col), "{message} should name {col}");
        }
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let dataset = load("diagnosis,diagnosis_description,recommended_action,fever\nFlu,x,y,1\n").unwrap();
        let flu = &dataset.records()[0];
        assert_eq!(flu.demographics, Demographics::default());
        assert_eq!(flu.duration_days, None);
    }

    #[test]
    fn test_no_symptom_columns() {
        let err = load("diagnosis,diagnosis_description,recommended_action\nFlu,x,y\n").unwrap_err();
        assert!(matches!(err, Error::DatasetFormat(_)));
    }

    #[test]
    fn test_duplicate_column() {
        let err = load("diagnosis,diagnosis_description,recommended_action,fever,Fever\nFlu,x,y,1,1\n")
            .unwrap_err();
        assert!(matches!(err, Error::DatasetFormat(_)));
    }

    #[test]
    fn test_all_rows_rejected_is_fatal() {
        let err = load("diagnosis,diagnosis_description,recommended_action,fever\n  ,x,y,1\n").unwrap_err();
        assert!(matches!(err, Error::EmptyDataset(_)));
    }

    #[test]
    fn test_ragged_row_is_fatal() {
        let err = load("diagnosis,diagnosis_description,recommended_action,fever\nFlu,x\n").unwrap_err();
        assert!(matches!(err, Error::DatasetFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CaseLoader::load_file(Path::new("/nonexistent/cases.csv")).unwrap_err();
        assert!(matches!(err, Error::DatasetMissing(_)));
    }

    #[test]
    fn test_load_twice_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.csv");
        std::fs::write(&path, TABLE).unwrap();
        let first = CaseLoader::load_file(&path).unwrap();
        let second = CaseLoader::load_file(&path).unwrap();
        assert_eq!(first, second);
    }
}
