//! Read-only catalog snapshot.
//!
//! A [`CatalogSnapshot`] is built once per engine from whatever the corpus
//! provider returned and is never mutated afterward.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::search::tokenizer::{normalize, stem, stem_set, tokenize};

pub mod provider;

pub use provider::{CorpusProvider, JsonCorpus, StaticCorpus};

/// One searchable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableEntry {
    /// Opaque catalog identifier
    pub id: String,
    /// Name as shown to the user
    pub display_name: String,
    /// Lowercased, diacritics-folded name
    #[serde(default)]
    pub normalized_name: String,
    /// Precomputed token list, in name order
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl SearchableEntry {
    /// Build an entry whose normalized name and tokens are derived from `display_name`.
    pub fn from_name(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            id: id.into(),
            normalized_name: normalize(&display_name),
            tokens: tokenize(&display_name),
            display_name,
        }
    }

    /// Normalize the provided name and tokens, deriving any that are missing
    /// from `display_name`. Provider tokens go through the query tokenizer so
    /// the index and queries agree on case and diacritics.
    #[must_use]
    pub fn with_derived_fields(mut self) -> Self {
        self.normalized_name = if self.normalized_name.is_empty() {
            normalize(&self.display_name)
        } else {
            normalize(&self.normalized_name)
        };
        self.tokens = self.tokens.iter().flat_map(|t| tokenize(t)).collect();
        if self.tokens.is_empty() {
            self.tokens = tokenize(&self.display_name);
        }
        self
    }

    /// Number of tokens in the name.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

/// Immutable snapshot of every searchable entry.
///
/// Stemmed token sets are computed once here so scoring never re-stems a
/// catalog name.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    entries: Vec<SearchableEntry>,
    stems: Vec<HashSet<String>>,
}

impl CatalogSnapshot {
    pub fn new(entries: Vec<SearchableEntry>) -> Self {
        let entries: Vec<SearchableEntry> = entries
            .into_iter()
            .map(SearchableEntry::with_derived_fields)
            .collect();
        let stems = entries.iter().map(|e| stem_set(&e.tokens)).collect();
        Self { entries, stems }
    }

    /// An empty snapshot, used when the corpus could not be fetched.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SearchableEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&SearchableEntry> {
        self.entries.get(position)
    }

    /// Stemmed token set of the entry at `position` (empty if out of range).
    pub fn stems(&self, position: usize) -> &HashSet<String> {
        static EMPTY: std::sync::LazyLock<HashSet<String>> =
            std::sync::LazyLock::new(HashSet::new);
        self.stems.get(position).unwrap_or(&EMPTY)
    }

    /// True if the entry contains `word` as a stemmed token or as a substring
    /// of its normalized name.
    pub fn entry_mentions(&self, position: usize, word: &str) -> bool {
        let Some(entry) = self.entries.get(position) else {
            return false;
        };
        entry.normalized_name.contains(word)
            || self.stems(position).contains(&stem(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_derives_fields() {
        let entry = SearchableEntry::from_name("ex-1", "Goblet Squat");
        assert_eq!(entry.normalized_name, "goblet squat");
        assert_eq!(entry.tokens, vec!["goblet", "squat"]);
        assert_eq!(entry.token_count(), 2);
    }

    #[test]
    fn test_with_derived_fields_keeps_provided_tokens() {
        let entry = SearchableEntry {
            id: "ex-2".to_string(),
            display_name: "Pull-Up".to_string(),
            normalized_name: String::new(),
            tokens: vec!["pullup".to_string()],
        }
        .with_derived_fields();
        assert_eq!(entry.normalized_name, "pull-up");
        assert_eq!(entry.tokens, vec!["pullup"]);
    }

    #[test]
    fn test_with_derived_fields_normalizes_provided_values() {
        let entry = SearchableEntry {
            id: "ex-3".to_string(),
            display_name: "Développé Couché".to_string(),
            normalized_name: "Développé Couché".to_string(),
            tokens: vec!["Développé".to_string(), "Couché".to_string(), " ".to_string()],
        }
        .with_derived_fields();
        assert_eq!(entry.normalized_name, "developpe couche");
        assert_eq!(entry.tokens, vec!["developpe", "couche"]);
    }

    #[test]
    fn test_snapshot_normalizes_entries() {
        let snapshot = CatalogSnapshot::new(vec![SearchableEntry {
            id: "ex-4".to_string(),
            display_name: "Barbell Squat".to_string(),
            normalized_name: String::new(),
            tokens: vec!["Barbell".to_string(), "Squats".to_string()],
        }]);
        assert_eq!(snapshot.entries()[0].tokens, vec!["barbell", "squats"]);
        assert!(snapshot.stems(0).contains("squat"));
        assert!(snapshot.entry_mentions(0, "barbell"));
    }

    #[test]
    fn test_snapshot_stems_and_mentions() {
        let snapshot =
            CatalogSnapshot::new(vec![SearchableEntry::from_name("1", "Walking Lunges")]);
        assert!(snapshot.stems(0).contains("lung"));
        assert!(snapshot.entry_mentions(0, "lunges"));
        assert!(snapshot.entry_mentions(0, "walk"));
        assert!(!snapshot.entry_mentions(0, "squat"));
        assert!(snapshot.stems(7).is_empty());
    }

    #[test]
    fn test_entry_deserializes_with_missing_fields() {
        let entry: SearchableEntry =
            serde_json::from_str(r#"{"id":"9","displayName":"Box Jumps"}"#).expect("parse");
        let entry = entry.with_derived_fields();
        assert_eq!(entry.tokens, vec!["box", "jumps"]);
    }
}
