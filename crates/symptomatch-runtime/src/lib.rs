//! Symptomatch Runtime: the end-to-end diagnosis pipeline.
//!
//! text → extractor → {case matcher, predictor} → combiner → assembler.

pub mod assembler;
pub mod engine;
pub mod types;

pub use assembler::{ResponseAssembler, GENERIC_ACTION, GENERIC_DESCRIPTION, NO_MATCH_MESSAGE};
pub use engine::DiagnosisEngine;
pub use types::*;
