//! Symptom extraction: free text to canonical symptom keys.
//!
//! A [`Vocabulary`] maps each canonical key to its trigger phrases. The
//! [`SymptomExtractor`] normalizes input text and scans for those phrases,
//! longest first, so that specific phrases win over generic ones.

pub mod extract;
pub mod normalize;
pub mod vocabulary;

pub use extract::{Extraction, SymptomExtractor};
pub use normalize::normalize_text;
pub use vocabulary::{Vocabulary, VocabularyEntry};
