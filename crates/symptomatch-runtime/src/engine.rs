//! Diagnosis engine: coordinates extraction, evidence sources, combination
//! and response assembly.
//!
//! Built once at startup and then shared read-only; `diagnose` takes `&self`
//! and is safe to call from many threads at once.

use std::sync::Arc;
use std::time::Instant;

use symptomatch_cases::{CaseDataset, CaseLoader};
use symptomatch_core::{Demographics, EngineConfig, Result, SymptomSet};
use symptomatch_extract::{Extraction, SymptomExtractor, Vocabulary};
use symptomatch_infer::{create_predictor, PredictorBackend};
use symptomatch_resolve::{
    CaseMatcher, EvidenceQuery, EvidenceSource, MatcherConfig, PredictorSource, ResultCombiner, SourceOutcome,
    SourceOutput,
};
use tracing::{debug, info, warn};

use crate::assembler::ResponseAssembler;
use crate::types::DifferentialResult;

pub struct DiagnosisEngine {
    extractor: SymptomExtractor,
    dataset: Arc<CaseDataset>,
    sources: Vec<Arc<dyn EvidenceSource>>,
    combiner: ResultCombiner,
    assembler: ResponseAssembler,
}

impl DiagnosisEngine {
    /// Load vocabulary, case table and predictor as configured.
    ///
    /// A missing or malformed case table is fatal. A predictor that cannot
    /// be built is not; the engine then runs on case matching alone.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let vocabulary = match &config.vocabulary_path {
            Some(path) => Vocabulary::from_json(path)?,
            None => Vocabulary::builtin(),
        };
        let dataset = CaseLoader::load_file(&config.cases_path)?;
        check_coverage(&vocabulary, &dataset);

        let predictor = create_predictor(config, &vocabulary, &dataset);
        Ok(Self::new(config, Arc::new(vocabulary), Arc::new(dataset), predictor))
    }

    /// Wire the standard sources: case matcher plus statistical predictor.
    pub fn new(
        config: &EngineConfig,
        vocabulary: Arc<Vocabulary>,
        dataset: Arc<CaseDataset>,
        predictor: Arc<dyn PredictorBackend>,
    ) -> Self {
        let matcher: Arc<dyn EvidenceSource> = Arc::new(CaseMatcher::new(
            dataset.clone(),
            vocabulary.clone(),
            MatcherConfig::from(config),
        ));
        let statistical: Arc<dyn EvidenceSource> =
            Arc::new(PredictorSource::new(predictor, vocabulary.clone(), config.top_n));
        Self::with_sources(config, vocabulary, dataset, vec![matcher, statistical])
    }

    /// Build with an explicit source list.
    pub fn with_sources(
        config: &EngineConfig,
        vocabulary: Arc<Vocabulary>,
        dataset: Arc<CaseDataset>,
        sources: Vec<Arc<dyn EvidenceSource>>,
    ) -> Self {
        info!(
            "Diagnosis engine ready: records={}, labels={}, vocabulary={}, sources={}",
            dataset.len(),
            dataset.labels().count(),
            vocabulary.len(),
            sources.len()
        );
        Self {
            extractor: SymptomExtractor::new(vocabulary).with_negation(config.detect_negation),
            assembler: ResponseAssembler::new(dataset.clone()),
            dataset,
            sources,
            combiner: ResultCombiner::from_config(config),
        }
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        self.extractor.vocabulary()
    }

    pub fn dataset(&self) -> &Arc<CaseDataset> {
        &self.dataset
    }

    /// Symptom keys mentioned in `text`.
    pub fn extract(&self, text: &str) -> SymptomSet {
        self.extractor.extract(text).symptoms
    }

    /// Extraction with trigger phrases and negated mentions.
    pub fn extract_detailed(&self, text: &str) -> Extraction {
        self.extractor.extract(text)
    }

    /// Ranked differential diagnosis for a free-text description.
    ///
    /// Always returns a result; no evidence yields an insufficient-evidence
    /// status rather than an error.
    pub fn diagnose(&self, text: &str, age_group: Option<&str>, gender: Option<&str>) -> DifferentialResult {
        let start = Instant::now();
        let extraction = self.extractor.extract(text);
        let demographics = Demographics::new(age_group, gender);

        let outputs = self.gather(&EvidenceQuery {
            symptoms: &extraction.symptoms,
            demographics: &demographics,
        });
        let combination = self.combiner.combine(&outputs, extraction.symptoms.len());
        let result = self.assembler.assemble(combination, extraction, demographics);

        debug!(
            "diagnose: symptoms=[{}] status={:?} top={:?} took={:?}",
            result.symptoms.signature(),
            result.status,
            result.top().map(|d| d.diagnosis.as_str()),
            start.elapsed()
        );
        result
    }

    /// Ask every source. Sources are independent, so with more than one they
    /// run on scoped threads. A source that panics counts as unavailable.
    fn gather(&self, query: &EvidenceQuery<'_>) -> Vec<SourceOutput> {
        if self.sources.len() < 2 {
            return self
                .sources
                .iter()
                .map(|s| SourceOutput {
                    kind: s.kind(),
                    outcome: s.propose(query),
                })
                .collect();
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .sources
                .iter()
                .map(|source| (source.kind(), scope.spawn(move || source.propose(query))))
                .collect();
            handles
                .into_iter()
                .map(|(kind, handle)| {
                    let outcome = handle.join().unwrap_or_else(|_| {
                        warn!("Evidence source {} panicked", kind);
                        SourceOutcome::Unavailable(format!("{kind} source failed"))
                    });
                    SourceOutput { kind, outcome }
                })
                .collect()
        })
    }
}

/// Log mismatches between the vocabulary and the dataset's symptom columns.
fn check_coverage(vocabulary: &Vocabulary, dataset: &CaseDataset) {
    let unknown: Vec<&str> = dataset
        .symptom_columns()
        .iter()
        .filter(|c| !vocabulary.contains(c))
        .map(|c| c.as_str())
        .collect();
    if !unknown.is_empty() {
        warn!(
            "{} symptom column(s) not in vocabulary and never extractable: {}",
            unknown.len(),
            unknown.join(", ")
        );
    }
    let uncovered = vocabulary
        .keys()
        .filter(|k| !dataset.symptom_columns().contains(k))
        .count();
    if uncovered > 0 {
        debug!("{} vocabulary key(s) have no dataset column", uncovered);
    }
}
