//! Symptom vocabulary: canonical keys and their trigger phrases.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use symptomatch_core::{Error, Result, SymptomKey, SymptomSet};
use tracing::info;

use crate::normalize::normalize_phrase;

/// One canonical symptom with its trigger phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub key: SymptomKey,
    pub phrases: Vec<String>,
    /// Relative importance in weighted similarity. Defaults to 1.0.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl VocabularyEntry {
    pub fn new(key: &str, phrases: &[&str]) -> Self {
        Self {
            key: SymptomKey::new(key),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// A normalized phrase pointing back at its entry.
#[derive(Debug, Clone)]
pub(crate) struct Trigger {
    pub phrase: String,
    pub entry: usize,
}

/// Immutable symptom vocabulary.
///
/// Entry order is the fixed vector order used by statistical predictors.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    entries: Vec<VocabularyEntry>,
    index: HashMap<SymptomKey, usize>,
    /// All phrases, longest first, ties by phrase text.
    triggers: Vec<Trigger>,
}

impl Vocabulary {
    /// Build a vocabulary. Entries sharing a key are merged; phrases are
    /// normalized and deduplicated per key.
    pub fn new(entries: Vec<VocabularyEntry>) -> Result<Self> {
        let mut merged: Vec<VocabularyEntry> = Vec::with_capacity(entries.len());
        let mut index: HashMap<SymptomKey, usize> = HashMap::new();

        for entry in entries {
            if entry.key.as_str().is_empty() {
                return Err(Error::Config("vocabulary entry with empty key".into()));
            }
            if !(entry.weight > 0.0 && entry.weight.is_finite()) {
                return Err(Error::Config(format!(
                    "vocabulary entry '{}' has non-positive weight {}",
                    entry.key, entry.weight
                )));
            }

            let slot = match index.get(&entry.key) {
                Some(&i) => i,
                None => {
                    index.insert(entry.key.clone(), merged.len());
                    merged.push(VocabularyEntry {
                        key: entry.key.clone(),
                        phrases: Vec::new(),
                        weight: entry.weight,
                    });
                    merged.len() - 1
                }
            };

            for phrase in &entry.phrases {
                let normalized = normalize_phrase(phrase);
                if !normalized.is_empty() && !merged[slot].phrases.contains(&normalized) {
                    merged[slot].phrases.push(normalized);
                }
            }
        }

        if let Some(empty) = merged.iter().find(|e| e.phrases.is_empty()) {
            return Err(Error::Config(format!(
                "vocabulary entry '{}' has no usable phrases",
                empty.key
            )));
        }

        let mut triggers: Vec<Trigger> = merged
            .iter()
            .enumerate()
            .flat_map(|(i, e)| {
                e.phrases.iter().map(move |p| Trigger {
                    phrase: p.clone(),
                    entry: i,
                })
            })
            .collect();
        triggers.sort_by(|a, b| {
            b.phrase
                .len()
                .cmp(&a.phrase.len())
                .then_with(|| a.phrase.cmp(&b.phrase))
        });

        Ok(Self {
            entries: merged,
            index,
            triggers,
        })
    }

    /// The built-in vocabulary of common presenting symptoms.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Load a vocabulary from a JSON array of entries.
    pub fn from_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read vocabulary {}: {e}", path.display()))
        })?;
        let entries: Vec<VocabularyEntry> = serde_json::from_str(&raw)?;
        let vocabulary = Self::new(entries)?;
        info!(
            "Loaded vocabulary from {} ({} symptoms)",
            path.display(),
            vocabulary.len()
        );
        Ok(vocabulary)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    /// Canonical keys in vector order.
    pub fn keys(&self) -> impl Iterator<Item = &SymptomKey> {
        self.entries.iter().map(|e| &e.key)
    }

    pub fn contains(&self, key: &SymptomKey) -> bool {
        self.index.contains_key(key)
    }

    /// Position of a key in vector order.
    pub fn position(&self, key: &SymptomKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Similarity weight for a key; keys outside the vocabulary weigh 1.0.
    pub fn weight(&self, key: &SymptomKey) -> f64 {
        self.position(key)
            .map(|i| self.entries[i].weight)
            .unwrap_or(1.0)
    }

    /// Presence vector (1.0 / 0.0) over the vocabulary, in vector order.
    /// Keys outside the vocabulary are ignored.
    pub fn presence_vector(&self, symptoms: &SymptomSet) -> Vec<f32> {
        let mut vector = vec![0.0; self.entries.len()];
        for key in symptoms {
            if let Some(i) = self.position(key) {
                vector[i] = 1.0;
            }
        }
        vector
    }

    pub(crate) fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub(crate) fn entry(&self, i: usize) -> &VocabularyEntry {
        &self.entries[i]
    }
}

static BUILTIN: Lazy<Vocabulary> = Lazy::new(|| {
    let entries = vec![
        VocabularyEntry::new("headache", &["headache", "head ache", "head hurts", "head pain", "migraine"]),
        VocabularyEntry::new("dizziness", &["dizziness", "dizzy", "lightheaded", "light headed", "vertigo"]),
        VocabularyEntry::new("fever", &["fever", "feverish", "high temperature", "temperature"]),
        VocabularyEntry::new("chills", &["chills", "shivering", "shivers"]),
        VocabularyEntry::new("cough", &["cough", "coughing"]),
        VocabularyEntry::new("sore_throat", &["sore throat", "throat pain", "scratchy throat", "painful swallowing"]),
        VocabularyEntry::new("runny_nose", &["runny nose", "nasal discharge", "stuffy nose", "congestion", "blocked nose"]),
        VocabularyEntry::new("sneezing", &["sneezing", "sneeze"]),
        VocabularyEntry::new("shortness_of_breath", &["shortness of breath", "short of breath", "breathless", "difficulty breathing", "trouble breathing", "can t breathe"])
            .with_weight(1.5),
        VocabularyEntry::new("wheezing", &["wheezing", "wheeze"]),
        VocabularyEntry::new("chest_pain", &["chest pain", "chest tightness", "tight chest", "chest pressure"])
            .with_weight(1.5),
        VocabularyEntry::new("palpitations", &["palpitations", "racing heart", "heart pounding", "irregular heartbeat"]),
        VocabularyEntry::new("fatigue", &["fatigue", "tired", "tiredness", "exhausted", "exhaustion", "no energy", "weakness"]),
        VocabularyEntry::new("body_aches", &["body aches", "body ache", "muscle aches", "muscle pain", "aching muscles"]),
        VocabularyEntry::new("joint_pain", &["joint pain", "painful joints", "aching joints", "stiff joints"]),
        VocabularyEntry::new("back_pain", &["back pain", "backache", "lower back"]),
        VocabularyEntry::new("neck_stiffness", &["stiff neck", "neck stiffness"]).with_weight(1.5),
        VocabularyEntry::new("nausea", &["nausea", "nauseous", "queasy", "feel sick"]),
        VocabularyEntry::new("vomiting", &["vomiting", "vomit", "throwing up", "threw up"]),
        VocabularyEntry::new("diarrhea", &["diarrhea", "diarrhoea", "loose stools", "watery stools"]),
        VocabularyEntry::new("constipation", &["constipation", "constipated"]),
        VocabularyEntry::new("abdominal_pain", &["abdominal pain", "stomach pain", "stomach ache", "stomachache", "belly pain", "cramps"]),
        VocabularyEntry::new("loss_of_appetite", &["loss of appetite", "no appetite", "not hungry"]),
        VocabularyEntry::new("heartburn", &["heartburn", "acid reflux", "indigestion"]),
        VocabularyEntry::new("rash", &["rash", "skin rash", "hives", "red spots"]),
        VocabularyEntry::new("itching", &["itching", "itchy", "itch"]),
        VocabularyEntry::new("swelling", &["swelling", "swollen", "puffiness"]),
        VocabularyEntry::new("frequent_urination", &["frequent urination", "urinating often", "peeing a lot"]),
        VocabularyEntry::new("painful_urination", &["painful urination", "burning urination", "burning when peeing", "burns when i pee"]),
        VocabularyEntry::new("excessive_thirst", &["excessive thirst", "always thirsty", "very thirsty"]),
        VocabularyEntry::new("weight_loss", &["weight loss", "losing weight", "lost weight"]),
        VocabularyEntry::new("blurred_vision", &["blurred vision", "blurry vision", "vision problems"]),
        VocabularyEntry::new("sensitivity_to_light", &["sensitivity to light", "light sensitivity", "photophobia"]),
        VocabularyEntry::new("ear_pain", &["ear pain", "earache", "ear ache"]),
        VocabularyEntry::new("numbness", &["numbness", "numb", "tingling", "pins and needles"]),
        VocabularyEntry::new("confusion", &["confusion", "confused", "disoriented"]).with_weight(1.5),
        VocabularyEntry::new("anxiety", &["anxiety", "anxious", "worried", "panic"]),
        VocabularyEntry::new("insomnia", &["insomnia", "can t sleep", "trouble sleeping", "sleeplessness"]),
        VocabularyEntry::new("night_sweats", &["night sweats", "sweating at night"]),
        VocabularyEntry::new("sweating", &["sweating", "sweaty", "perspiration"]),
        VocabularyEntry::new("loss_of_smell", &["loss of smell", "can t smell", "loss of taste"]),
    ];
    Vocabulary::new(entries).expect("builtin vocabulary is well-formed")
});
