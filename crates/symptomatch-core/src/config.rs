//! Engine configuration: file, environment overrides, and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_CASES_PATH: &str = "data/cases.csv";
pub const DEFAULT_TOP_N: usize = 5;

/// Which statistical predictor backend to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    /// No secondary signal; the case matcher runs alone.
    None,
    /// Bernoulli naive Bayes fitted from the case table at startup.
    #[default]
    NaiveBayes,
    /// Pre-fitted linear model loaded from `model_path`.
    Artifact,
}

impl std::str::FromStr for PredictorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "naive_bayes" | "naive-bayes" | "nb" => Ok(Self::NaiveBayes),
            "artifact" | "model" => Ok(Self::Artifact),
            other => Err(Error::Config(format!("unknown predictor kind '{other}'"))),
        }
    }
}

/// Set-similarity metric used by the case matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// `|A ∩ B| / |A ∪ B|`.
    #[default]
    Jaccard,
    /// Jaccard with per-key vocabulary weights summed instead of counted.
    WeightedJaccard,
}

/// How demographic disagreement between query and case record is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemographicPolicy {
    /// Demographics play no part in scoring.
    Ignore,
    /// Multiply the record score by the penalty once per mismatching field.
    #[default]
    Soften,
    /// Skip records with any mismatching known field.
    Exclude,
}

/// Fixed weighting policy for merging case-matcher and predictor confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombineWeights {
    /// Matcher weight with a single extracted symptom.
    #[serde(default = "default_matcher_base")]
    pub matcher_base: f64,
    /// Added matcher weight per extra extracted symptom.
    #[serde(default = "default_matcher_step")]
    pub matcher_step: f64,
    /// Upper bound on the matcher weight.
    #[serde(default = "default_matcher_max")]
    pub matcher_max: f64,
    /// Multiplier for a label proposed by only one of two non-empty sources.
    #[serde(default = "default_single_source_discount")]
    pub single_source_discount: f64,
}

fn default_matcher_base() -> f64 {
    0.5
}
fn default_matcher_step() -> f64 {
    0.1
}
fn default_matcher_max() -> f64 {
    0.8
}
fn default_single_source_discount() -> f64 {
    0.85
}

impl Default for CombineWeights {
    fn default() -> Self {
        Self {
            matcher_base: default_matcher_base(),
            matcher_step: default_matcher_step(),
            matcher_max: default_matcher_max(),
            single_source_discount: default_single_source_discount(),
        }
    }
}

impl CombineWeights {
    /// Matcher weight for a query with `symptom_count` extracted symptoms.
    /// The predictor receives `1 - weight`.
    pub fn matcher_weight(&self, symptom_count: usize) -> f64 {
        let extra = symptom_count.saturating_sub(1) as f64;
        (self.matcher_base + self.matcher_step * extra).clamp(self.matcher_base, self.matcher_max)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_cases_path")]
    pub cases_path: PathBuf,
    #[serde(default)]
    pub vocabulary_path: Option<PathBuf>,
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    #[serde(default)]
    pub predictor: PredictorKind,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Minimum similarity for a record to count as supporting its label.
    #[serde(default = "default_support_floor")]
    pub support_floor: f64,
    #[serde(default)]
    pub similarity: SimilarityMetric,
    #[serde(default)]
    pub demographic_policy: DemographicPolicy,
    #[serde(default = "default_demographic_penalty")]
    pub demographic_penalty: f64,
    #[serde(default)]
    pub detect_negation: bool,
    #[serde(default = "default_cache_size")]
    pub prediction_cache_size: usize,
    #[serde(default = "default_cache_ttl")]
    pub prediction_cache_ttl_secs: u64,
    #[serde(default)]
    pub combine: CombineWeights,
}

fn default_cases_path() -> PathBuf {
    PathBuf::from(DEFAULT_CASES_PATH)
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_support_floor() -> f64 {
    0.05
}
fn default_demographic_penalty() -> f64 {
    0.85
}
fn default_cache_size() -> usize {
    1024
}
fn default_cache_ttl() -> u64 {
    3600
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cases_path: default_cases_path(),
            vocabulary_path: None,
            model_path: None,
            predictor: PredictorKind::default(),
            top_n: default_top_n(),
            support_floor: default_support_floor(),
            similarity: SimilarityMetric::default(),
            demographic_policy: DemographicPolicy::default(),
            demographic_penalty: default_demographic_penalty(),
            detect_negation: false,
            prediction_cache_size: default_cache_size(),
            prediction_cache_ttl_secs: default_cache_ttl(),
            combine: CombineWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Load config from a JSON file (defaults if the file does not exist),
    /// apply environment overrides, and validate.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let raw = std::fs::read_to_string(config_path)?;
            let parsed: EngineConfig = serde_json::from_str(&raw)?;
            info!("Loaded engine config from {}", config_path.display());
            parsed
        } else {
            EngineConfig::default()
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `SYMPTOMATCH_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("SYMPTOMATCH_CASES") {
            self.cases_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("SYMPTOMATCH_VOCABULARY") {
            self.vocabulary_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("SYMPTOMATCH_MODEL") {
            self.model_path = Some(PathBuf::from(path));
        }
        if let Ok(kind) = std::env::var("SYMPTOMATCH_PREDICTOR") {
            self.predictor = kind.parse()?;
        }
        if let Ok(n) = std::env::var("SYMPTOMATCH_TOP_N") {
            self.top_n = n
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("SYMPTOMATCH_TOP_N is not a number: '{n}'")))?;
        }
        if let Ok(flag) = std::env::var("SYMPTOMATCH_NEGATION") {
            self.detect_negation = matches!(flag.trim(), "1" | "true" | "yes" | "on");
        }
        Ok(())
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::Config("top_n must be at least 1".into()));
        }
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(Error::Config(format!("{name} must be within [0, 1], got {v}")))
            }
        };
        unit("support_floor", self.support_floor)?;
        unit("demographic_penalty", self.demographic_penalty)?;
        unit("combine.matcher_base", self.combine.matcher_base)?;
        unit("combine.matcher_max", self.combine.matcher_max)?;
        unit("combine.single_source_discount", self.combine.single_source_discount)?;
        let step = self.combine.matcher_step;
        if !(step.is_finite() && step >= 0.0) {
            return Err(Error::Config(format!(
                "combine.matcher_step must be finite and non-negative, got {step}"
            )));
        }
        if self.combine.matcher_max < self.combine.matcher_base {
            return Err(Error::Config(
                "combine.matcher_max must not be below combine.matcher_base".into(),
            ));
        }
        if self.predictor == PredictorKind::Artifact && self.model_path.is_none() {
            return Err(Error::Config(
                "predictor 'artifact' requires model_path".into(),
            ));
        }
        Ok(())
    }
}
