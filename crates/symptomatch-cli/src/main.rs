//! Symptomatch: symptom-to-diagnosis matching from the command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use symptomatch_cases::{CaseDataset, CaseLoader};
use symptomatch_core::EngineConfig;
use symptomatch_extract::{SymptomExtractor, Vocabulary};
use symptomatch_infer::LinearModel;
use symptomatch_runtime::DiagnosisEngine;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod args;

use args::Command;

fn resolve_config_path() -> PathBuf {
    std::env::var("SYMPTOMATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("symptomatch.json"))
}

fn load_vocabulary(config: &EngineConfig) -> anyhow::Result<Vocabulary> {
    Ok(match &config.vocabulary_path {
        Some(path) => Vocabulary::from_json(path)?,
        None => Vocabulary::builtin(),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(dataset: &CaseDataset, vocabulary: &Vocabulary) {
    let report = dataset.report();
    let unknown: Vec<&str> = dataset
        .symptom_columns()
        .iter()
        .filter(|c| !vocabulary.contains(c))
        .map(|c| c.as_str())
        .collect();

    println!("=== Symptomatch Case Table Report ===");
    println!();
    println!("Source:             {}", report.origin);
    println!("Rows read:          {}", report.rows_read);
    println!("Rows rejected:      {}", report.rows_rejected);
    println!("Records:            {}", dataset.len());
    println!("Symptom columns:    {}", report.symptom_columns);
    println!("Diagnoses:          {}", report.labels);

    if !unknown.is_empty() {
        println!();
        println!("Warnings:");
        for column in &unknown {
            println!("  - column '{}' is not in the vocabulary and can never match", column);
        }
    }

    let undescribed: Vec<&str> = dataset
        .labels()
        .filter(|l| dataset.description_record(l).is_none())
        .collect();
    if !undescribed.is_empty() {
        println!();
        println!("Diagnoses without a description:");
        for label in &undescribed {
            println!("  - {}", label);
        }
    }

    println!();
    println!("Status: READY FOR USE");
}

fn validate(config: &EngineConfig, cases: Option<&Path>) -> anyhow::Result<bool> {
    let vocabulary = load_vocabulary(config)?;
    let path = cases.unwrap_or(&config.cases_path);
    match CaseLoader::load_file(path) {
        Ok(dataset) => {
            print_report(&dataset, &vocabulary);
            Ok(true)
        }
        Err(e) => {
            println!("=== Symptomatch Case Table Report ===");
            println!();
            println!("Source:             {}", path.display());
            println!("Error:              {}", e);
            println!();
            println!("Status: INVALID");
            Ok(false)
        }
    }
}

fn fit_model(config: &EngineConfig, out: &Path) -> anyhow::Result<()> {
    let vocabulary = load_vocabulary(config)?;
    let dataset = CaseLoader::load_file(&config.cases_path)?;
    let model = LinearModel::fit_naive_bayes(&vocabulary, &dataset)?;
    model.save(out)?;
    info!(
        "Saved model artifact to {} (labels={}, features={})",
        out.display(),
        model.labels().len(),
        model.feature_count()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Logs on stderr, results on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let command = match args::parse(&argv) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    if command == Command::Help {
        println!("{}", args::USAGE);
        return Ok(());
    }

    let config_path = resolve_config_path();
    let config = EngineConfig::load(&config_path)
        .map_err(|e| anyhow::anyhow!("Invalid configuration {}: {}", config_path.display(), e))?;

    match command {
        Command::Extract { text } => {
            let vocabulary = load_vocabulary(&config)?;
            let extractor = SymptomExtractor::new(Arc::new(vocabulary)).with_negation(config.detect_negation);
            print_json(&extractor.extract(&text))?;
        }
        Command::Diagnose {
            text,
            age_group,
            gender,
        } => {
            let engine = DiagnosisEngine::from_config(&config)
                .map_err(|e| anyhow::anyhow!("Failed to start engine: {}", e))?;
            let result = engine.diagnose(&text, age_group.as_deref(), gender.as_deref());
            print_json(&result)?;
        }
        Command::Validate { cases } => {
            let ok = validate(&config, cases.as_deref())?;
            std::process::exit(if ok { 0 } else { 1 });
        }
        Command::FitModel { out } => fit_model(&config, &out)?,
        Command::Help => {}
    }

    Ok(())
}
