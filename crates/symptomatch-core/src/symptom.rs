//! Canonical symptom identifiers, symptom sets, and demographic tags.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Tag used for any demographic field the caller did not supply.
pub const UNKNOWN_TAG: &str = "unknown";

/// Normalized identifier for one symptom concept (e.g. `shortness_of_breath`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SymptomKey(String);

impl SymptomKey {
    /// Build a key, trimming and lower-casing the raw identifier.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SymptomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deserialized keys go through the same normalization as `new`.
impl<'de> Deserialize<'de> for SymptomKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl From<&str> for SymptomKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Set of canonical symptom keys. Ordered so iteration and serialization
/// are deterministic; duplicates collapse on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymptomSet(BTreeSet<SymptomKey>);

impl SymptomSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key. Returns false if it was already present.
    pub fn insert(&mut self, key: SymptomKey) -> bool {
        self.0.insert(key)
    }

    pub fn contains(&self, key: &SymptomKey) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymptomKey> {
        self.0.iter()
    }

    /// Keys present in both sets, in key order.
    pub fn intersection<'a>(&'a self, other: &'a SymptomSet) -> impl Iterator<Item = &'a SymptomKey> {
        self.0.intersection(&other.0)
    }

    /// Keys present in either set, in key order.
    pub fn union<'a>(&'a self, other: &'a SymptomSet) -> impl Iterator<Item = &'a SymptomKey> {
        self.0.union(&other.0)
    }

    /// Stable textual signature, e.g. `"cough,fever"`. Used as a cache key.
    pub fn signature(&self) -> String {
        self.0
            .iter()
            .map(SymptomKey::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<SymptomKey> for SymptomSet {
    fn from_iter<I: IntoIterator<Item = SymptomKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for SymptomSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(SymptomKey::new).collect())
    }
}

impl<'a> IntoIterator for &'a SymptomSet {
    type Item = &'a SymptomKey;
    type IntoIter = std::collections::btree_set::Iter<'a, SymptomKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Demographic context for a query or a case record. Free-form tags,
/// lower-cased, `"unknown"` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Demographics {
    pub age_group: String,
    pub gender: String,
}

impl Default for Demographics {
    fn default() -> Self {
        Self {
            age_group: UNKNOWN_TAG.into(),
            gender: UNKNOWN_TAG.into(),
        }
    }
}

impl Demographics {
    pub fn new(age_group: Option<&str>, gender: Option<&str>) -> Self {
        Self {
            age_group: normalize_tag(age_group),
            gender: normalize_tag(gender),
        }
    }

    /// Number of fields where both sides carry a known tag and disagree.
    pub fn mismatches(&self, other: &Demographics) -> usize {
        [
            (&self.age_group, &other.age_group),
            (&self.gender, &other.gender),
        ]
        .iter()
        .filter(|(a, b)| is_known(a) && is_known(b) && a != b)
        .count()
    }
}

/// Whether a demographic tag carries information.
pub fn is_known(tag: &str) -> bool {
    tag != UNKNOWN_TAG
}

fn normalize_tag(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_lowercase(),
        _ => UNKNOWN_TAG.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalization() {
        assert_eq!(SymptomKey::new("  Headache "), SymptomKey::new("headache"));
        assert_eq!(SymptomKey::new("Sore_Throat").as_str(), "sore_throat");
    }

    #[test]
    fn test_set_collapses_duplicates() {
        let set: SymptomSet = ["fever", "cough", "fever"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.signature(), "cough,fever");
    }

    #[test]
    fn test_set_operations() {
        let a: SymptomSet = ["fever", "cough"].into_iter().collect();
        let b: SymptomSet = ["cough", "headache"].into_iter().collect();
        assert_eq!(a.intersection(&b).count(), 1);
        assert_eq!(a.union(&b).count(), 3);
    }

    #[test]
    fn test_demographics_default_unknown() {
        let d = Demographics::new(None, Some("   "));
        assert_eq!(d, Demographics::default());
    }

    #[test]
    fn test_demographic_mismatches() {
        let query = Demographics::new(Some("Adult"), Some("female"));
        let same = Demographics::new(Some("adult"), None);
        let different = Demographics::new(Some("child"), Some("male"));
        assert_eq!(query.mismatches(&same), 0);
        assert_eq!(query.mismatches(&different), 2);
        assert_eq!(Demographics::default().mismatches(&different), 0);
    }

    #[test]
    fn test_deserialized_key_is_normalized() {
        let key: SymptomKey = serde_json::from_str(r#"" Sore_Throat ""#).unwrap();
        assert_eq!(key, SymptomKey::new("sore_throat"));
        let set: SymptomSet = serde_json::from_str(r#"["Fever", "fever", "COUGH"]"#).unwrap();
        assert_eq!(set.signature(), "cough,fever");
    }
}
