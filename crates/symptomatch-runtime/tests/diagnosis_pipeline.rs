//! End-to-end pipeline tests: CSV on disk through `DiagnosisEngine`.
//!
//! Each test builds its own engine from a temp case table, so tests run in
//! parallel without sharing state.

use std::io::Write;
use std::sync::Arc;

use symptomatch_core::{DemographicPolicy, EngineConfig, PredictorKind, SymptomKey};
use symptomatch_resolve::{DiagnosisStatus, SourceKind};
use symptomatch_runtime::{DiagnosisEngine, NO_MATCH_MESSAGE};
use tempfile::NamedTempFile;

const CASES: &str = "\
diagnosis,diagnosis_description,recommended_action,age_group,gender,duration_days,medications,headache,dizziness,fever,cough,sore_throat
Migraine,Recurring severe headaches,Rest in a dark quiet room,adult,,2,ibuprofen;sumatriptan,1,1,0,0,0
Flu,Viral respiratory infection,Rest and drink fluids,,,6,paracetamol,0,0,1,1,0
Flu,,,,,8,,1,0,1,1,0
Common Cold,,,child,,5,,0,0,0,1,1
";

fn write_cases() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CASES.as_bytes()).unwrap();
    file
}

fn config(cases: &NamedTempFile, predictor: PredictorKind) -> EngineConfig {
    EngineConfig {
        cases_path: cases.path().to_path_buf(),
        predictor,
        ..EngineConfig::default()
    }
}

fn engine(predictor: PredictorKind) -> DiagnosisEngine {
    let cases = write_cases();
    DiagnosisEngine::from_config(&config(&cases, predictor)).unwrap()
}

#[test]
fn test_extract_scenario() {
    let engine = engine(PredictorKind::None);
    let symptoms = engine.extract("I have severe headache and dizziness");
    let keys: Vec<&str> = symptoms.iter().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["dizziness", "headache"]);
}

#[test]
fn test_extract_empty_and_deterministic() {
    let engine = engine(PredictorKind::None);
    assert!(engine.extract("").is_empty());
    let text = "Fever since Tuesday, with a bad cough and a sore throat.";
    assert_eq!(engine.extract(text), engine.extract(text));
}

#[test]
fn test_migraine_ranks_first() {
    let engine = engine(PredictorKind::None);
    let result = engine.diagnose("I have severe headache and dizziness", None, None);

    assert_eq!(result.status, DiagnosisStatus::Matched);
    let top = result.top().unwrap();
    assert_eq!(top.diagnosis, "Migraine");
    assert_eq!(top.confidence, 1.0);
    assert_eq!(top.description, "Recurring severe headaches");
    assert_eq!(top.medications, vec!["ibuprofen", "sumatriptan"]);
    assert_eq!(result.methods, vec![SourceKind::CaseMatch]);
    assert_eq!(result.unavailable_sources, vec![SourceKind::Statistical]);
    // The Flu record sharing `headache` ranks below Migraine.
    assert!(result.diagnoses.iter().skip(1).all(|d| d.confidence < top.confidence));
}

#[test]
fn test_both_sources_agree_on_top() {
    let engine = engine(PredictorKind::NaiveBayes);
    let result = engine.diagnose("I have severe headache and dizziness", None, None);
    let top = result.top().unwrap();
    assert_eq!(top.diagnosis, "Migraine");
    assert!(top.sources.contains(&SourceKind::CaseMatch));
    assert!(top.sources.contains(&SourceKind::Statistical));
    assert!(result.unavailable_sources.is_empty());
    assert!(result
        .diagnoses
        .windows(2)
        .all(|w| w[0].confidence >= w[1].confidence));
}

#[test]
fn test_unknown_symptoms_no_match() {
    let engine = engine(PredictorKind::NaiveBayes);
    let result = engine.diagnose("xyzzy plugh quux", None, None);
    assert!(result.symptoms.is_empty());
    assert_eq!(result.status, DiagnosisStatus::InsufficientEvidence);
    assert!(result.diagnoses.is_empty());
    assert_eq!(result.message.as_deref(), Some(NO_MATCH_MESSAGE));
}

#[test]
fn test_adversarial_input_never_fails() {
    let engine = engine(PredictorKind::NaiveBayes);
    for text in ["", "   ", "!!!???", "\u{0}\u{7f}", &"fever ".repeat(5_000)] {
        let result = engine.diagnose(text, Some(""), Some("   "));
        assert_eq!(result.demographics.age_group, "unknown");
        assert_eq!(result.demographics.gender, "unknown");
    }
}

#[test]
fn test_placeholder_text_for_undescribed_label() {
    let engine = engine(PredictorKind::None);
    let result = engine.diagnose("a sore throat and a cough", None, None);
    let cold = result
        .diagnoses
        .iter()
        .find(|d| d.diagnosis == "Common Cold")
        .unwrap();
    assert_eq!(cold.description, symptomatch_runtime::GENERIC_DESCRIPTION);
    assert_eq!(cold.recommended_action, symptomatch_runtime::GENERIC_ACTION);
}

#[test]
fn test_demographic_exclude_policy() {
    let cases = write_cases();
    let engine = DiagnosisEngine::from_config(&EngineConfig {
        demographic_policy: DemographicPolicy::Exclude,
        ..config(&cases, PredictorKind::None)
    })
    .unwrap();

    let result = engine.diagnose("sore throat and cough", Some("adult"), None);
    assert!(result.diagnoses.iter().all(|d| d.diagnosis != "Common Cold"));

    let result = engine.diagnose("sore throat and cough", Some("child"), None);
    assert_eq!(result.top().unwrap().diagnosis, "Common Cold");
}

#[test]
fn test_negation_when_enabled() {
    let cases = write_cases();
    let engine = DiagnosisEngine::from_config(&EngineConfig {
        detect_negation: true,
        ..config(&cases, PredictorKind::None)
    })
    .unwrap();

    let result = engine.diagnose("bad headache but no fever", None, None);
    assert!(result.symptoms.contains(&SymptomKey::from("headache")));
    assert!(result.negated_symptoms.contains(&SymptomKey::from("fever")));
    assert!(!result.symptoms.contains(&SymptomKey::from("fever")));
}

#[test]
fn test_result_json_shape() {
    let engine = engine(PredictorKind::NaiveBayes);
    let result = engine.diagnose("headache and dizziness", Some("adult"), None);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["status"], "matched");
    assert!(json["symptoms"].is_array());
    assert!(json["triggers"]["headache"].is_array());
    assert!(json["methods"].is_array());
    assert!(json["unavailableSources"].is_array());
    assert_eq!(json["demographics"]["age_group"], "adult");
    assert!(json.get("message").is_none());

    let top = &json["diagnoses"][0];
    assert_eq!(top["diagnosis"], "Migraine");
    assert!(top["confidence"].is_number());
    assert!(top["confidencePercent"].is_number());
    assert!(top["severity"].is_string());
    assert!(top["recommendedAction"].is_string());
    assert!(top["matchedSymptoms"].is_array());
    assert!(top["supportingRecords"].is_number());
    assert_eq!(top["typicalDurationDays"], 2.0);
}

#[test]
fn test_same_source_loads_identically() {
    let cases = write_cases();
    let cfg = config(&cases, PredictorKind::NaiveBayes);
    let a = DiagnosisEngine::from_config(&cfg).unwrap();
    let b = DiagnosisEngine::from_config(&cfg).unwrap();
    assert_eq!(a.dataset(), b.dataset());
    let text = "fever and cough";
    assert_eq!(a.diagnose(text, None, None), b.diagnose(text, None, None));
}

#[test]
fn test_missing_required_column_is_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"diagnosis,fever\nFlu,1\n").unwrap();
    let err = DiagnosisEngine::from_config(&config(&file, PredictorKind::None));
    assert!(matches!(err, Err(symptomatch_core::Error::DatasetFormat(_))));
}

#[test]
fn test_concurrent_requests() {
    let engine = Arc::new(engine(PredictorKind::NaiveBayes));
    let expected = engine.diagnose("fever and cough", None, None);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                let text = if i % 2 == 0 { "fever and cough" } else { "headache, dizzy" };
                (i, engine.diagnose(text, None, None))
            })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.join().unwrap();
        if i % 2 == 0 {
            assert_eq!(result, expected);
        } else {
            assert_eq!(result.top().unwrap().diagnosis, "Migraine");
        }
    }
}

#[test]
fn test_custom_vocabulary_keys_match_columns() {
    let cases = write_cases();
    let mut vocab = NamedTempFile::new().unwrap();
    vocab
        .write_all(
            br#"[{"key": "Headache", "phrases": ["headache"]},
                 {"key": " Dizziness ", "phrases": ["dizzy"]}]"#,
        )
        .unwrap();
    let engine = DiagnosisEngine::from_config(&EngineConfig {
        vocabulary_path: Some(vocab.path().to_path_buf()),
        ..config(&cases, PredictorKind::None)
    })
    .unwrap();

    let result = engine.diagnose("bad headache and dizzy", None, None);
    assert_eq!(result.symptoms.signature(), "dizziness,headache");
    assert_eq!(result.status, DiagnosisStatus::Matched);
    assert_eq!(result.top().unwrap().diagnosis, "Migraine");
}
