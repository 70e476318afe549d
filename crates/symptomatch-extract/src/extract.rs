//! Vocabulary-driven symptom extraction with optional negation detection.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use symptomatch_core::{SymptomKey, SymptomSet};

use crate::normalize::normalize_text;
use crate::vocabulary::Vocabulary;

/// Tokens that negate a symptom mentioned shortly after them.
const NEGATION_CUES: &[&str] = &["no", "not", "without", "denies", "denied", "deny", "never", "nor"];

/// Tokens that end the reach of a preceding negation cue.
const NEGATION_BREAKS: &[&str] = &["but", "however", "although", "except"];

/// How many tokens before a match are searched for a negation cue.
const NEGATION_WINDOW: usize = 3;

/// Fill byte for consumed spans. Never survives normalization.
const MASK: char = '#';

/// Result of extracting symptoms from one text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    /// Canonical keys found in the text.
    pub symptoms: SymptomSet,
    /// Normalized phrases that triggered each key, longest first, ties by
    /// phrase text. Independent of where they appear in the input.
    pub triggers: BTreeMap<SymptomKey, Vec<String>>,
    /// Keys mentioned only in negated form. Empty unless negation is enabled.
    pub negated: SymptomSet,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }
}

/// Converts free text into a [`SymptomSet`]. Never fails.
#[derive(Debug, Clone)]
pub struct SymptomExtractor {
    vocabulary: Arc<Vocabulary>,
    detect_negation: bool,
}

impl SymptomExtractor {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            detect_negation: false,
        }
    }

    pub fn with_negation(mut self, enabled: bool) -> Self {
        self.detect_negation = enabled;
        self
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    /// Extract canonical symptom keys from `text`.
    ///
    /// Phrases are tried longest first. Each occurrence that matches is
    /// masked out so shorter phrases cannot match inside it.
    pub fn extract(&self, text: &str) -> Extraction {
        let mut haystack = normalize_text(text);
        if haystack.is_empty() {
            return Extraction::default();
        }

        let mut affirmed: BTreeMap<SymptomKey, Vec<String>> = BTreeMap::new();
        let mut negated_only: BTreeMap<SymptomKey, Vec<String>> = BTreeMap::new();

        for trigger in self.vocabulary.triggers() {
            let key = &self.vocabulary.entry(trigger.entry).key;
            let mut from = 0;
            while let Some(offset) = haystack[from..].find(trigger.phrase.as_str()) {
                let start = from + offset;
                let end = start + trigger.phrase.len();

                // Anchor at a token start so "itch" never fires inside "switch".
                if !haystack[..start].ends_with(' ') {
                    from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
                    continue;
                }

                let negated = self.detect_negation && is_negated(&haystack[..start]);
                let bucket = if negated { &mut negated_only } else { &mut affirmed };
                let phrases = bucket.entry(key.clone()).or_default();
                if !phrases.contains(&trigger.phrase) {
                    phrases.push(trigger.phrase.clone());
                }

                let mask: String = std::iter::repeat(MASK).take(end - start).collect();
                haystack.replace_range(start..end, &mask);
                from = end;
            }
        }

        let symptoms: SymptomSet = affirmed.keys().cloned().collect();
        let negated: SymptomSet = negated_only
            .into_keys()
            .filter(|k| !symptoms.contains(k))
            .collect();

        Extraction {
            symptoms,
            triggers: affirmed,
            negated,
        }
    }
}

/// Whether the text immediately before a match carries a negation cue.
fn is_negated(preceding: &str) -> bool {
    let tokens: Vec<&str> = preceding.split_whitespace().collect();
    for (i, token) in tokens.iter().rev().take(NEGATION_WINDOW).enumerate() {
        if NEGATION_BREAKS.contains(token) {
            return false;
        }
        if NEGATION_CUES.contains(token) {
            return true;
        }
        // "free of <symptom>"
        if *token == "of" {
            let before = tokens.len().checked_sub(i + 2).and_then(|j| tokens.get(j));
            if before == Some(&"free") {
                return true;
            }
        }
    }
    false
}
