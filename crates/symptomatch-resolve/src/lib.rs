//! Evidence sources and result combination.
//!
//! Each [`EvidenceSource`] independently proposes ranked diagnosis
//! candidates for the same symptom set. The [`ResultCombiner`] merges their
//! outputs without knowing which concrete sources produced them.

pub mod combiner;
pub mod matcher;
pub mod predictor_source;
pub mod source;
pub mod types;

pub use combiner::ResultCombiner;
pub use matcher::{jaccard, scale_confidence, weighted_jaccard, CaseMatcher, MatcherConfig};
pub use predictor_source::PredictorSource;
pub use source::{EvidenceQuery, EvidenceSource, SourceOutcome, SourceOutput};
pub use types::*;
