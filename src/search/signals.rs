//! Lexical search signals proposed by the completion capability.
//!
//! [`RawSignals`] is the wire shape (lists of key/value pairs, anything goes).
//! [`SearchSignals`] can only be obtained through validation, so every
//! instance satisfies the cardinality, casing and weight-range limits below.
//! Deserializing a `SearchSignals` re-runs validation.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_HEADWORDS: usize = 3;
pub const MAX_KEYWORDS: usize = 8;
pub const MAX_SYNONYM_KEYS: usize = 8;
pub const MAX_SYNONYM_VALUES: usize = 6;
pub const MAX_PHRASE_BOOSTS: usize = 8;
pub const MAX_TOKEN_WEIGHTS: usize = 16;
/// Weights live in `[-WEIGHT_LIMIT, WEIGHT_LIMIT]`.
pub const WEIGHT_LIMIT: i32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("no usable headword")]
    MissingHeadword,
}

/// A synonym key with its alternatives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymPair {
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A phrase or token with a signed weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightPair {
    pub key: String,
    pub weight: i64,
}

/// Signals exactly as returned by the completion capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSignals {
    #[serde(default)]
    pub headwords: Vec<String>,
    #[serde(default)]
    pub priority_keywords: Vec<String>,
    #[serde(default)]
    pub banned_keywords: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<SynonymPair>,
    #[serde(default)]
    pub phrase_boosts: Vec<WeightPair>,
    #[serde(default)]
    pub token_weights: Vec<WeightPair>,
    #[serde(default)]
    pub negation_regex: Option<String>,
}

/// Validated signals for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSignals", into = "RawSignals")]
pub struct SearchSignals {
    headwords: Vec<String>,
    priority_keywords: Vec<String>,
    banned_keywords: Vec<String>,
    synonyms: BTreeMap<String, Vec<String>>,
    phrase_boosts: BTreeMap<String, i32>,
    token_weights: BTreeMap<String, i32>,
    negation_regex: Option<String>,
}

impl SearchSignals {
    /// Headwords in the model's priority order (1..=3 entries).
    pub fn headwords(&self) -> &[String] {
        &self.headwords
    }

    pub fn priority_keywords(&self) -> &[String] {
        &self.priority_keywords
    }

    pub fn banned_keywords(&self) -> &[String] {
        &self.banned_keywords
    }

    pub const fn synonyms(&self) -> &BTreeMap<String, Vec<String>> {
        &self.synonyms
    }

    pub const fn phrase_boosts(&self) -> &BTreeMap<String, i32> {
        &self.phrase_boosts
    }

    pub const fn token_weights(&self) -> &BTreeMap<String, i32> {
        &self.token_weights
    }

    pub fn negation_regex(&self) -> Option<&str> {
        self.negation_regex.as_deref()
    }

    /// Zero-based rank of `term` among the headwords.
    pub fn headword_position(&self, term: &str) -> Option<usize> {
        self.headwords.iter().position(|h| h == term)
    }

    /// Headwords followed by priority keywords.
    pub fn anchor_terms(&self) -> impl Iterator<Item = &str> {
        self.headwords
            .iter()
            .chain(self.priority_keywords.iter())
            .map(String::as_str)
    }
}

impl TryFrom<RawSignals> for SearchSignals {
    type Error = SignalError;

    fn try_from(raw: RawSignals) -> Result<Self, Self::Error> {
        let headwords = clean_terms(raw.headwords, MAX_HEADWORDS);
        if headwords.is_empty() {
            return Err(SignalError::MissingHeadword);
        }

        let mut synonyms = BTreeMap::new();
        for pair in raw.synonyms.into_iter().take(MAX_SYNONYM_KEYS) {
            let Some(key) = clean_term(&pair.key) else {
                continue;
            };
            let values = clean_terms(pair.values, MAX_SYNONYM_VALUES);
            if !values.is_empty() {
                synonyms.entry(key).or_insert(values);
            }
        }

        Ok(Self {
            headwords,
            priority_keywords: clean_terms(raw.priority_keywords, MAX_KEYWORDS),
            banned_keywords: clean_terms(raw.banned_keywords, MAX_KEYWORDS),
            synonyms,
            phrase_boosts: clean_weights(raw.phrase_boosts, MAX_PHRASE_BOOSTS),
            token_weights: clean_weights(raw.token_weights, MAX_TOKEN_WEIGHTS),
            negation_regex: raw
                .negation_regex
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }
}

impl From<SearchSignals> for RawSignals {
    fn from(signals: SearchSignals) -> Self {
        Self {
            headwords: signals.headwords,
            priority_keywords: signals.priority_keywords,
            banned_keywords: signals.banned_keywords,
            synonyms: signals
                .synonyms
                .into_iter()
                .map(|(key, values)| SynonymPair { key, values })
                .collect(),
            phrase_boosts: weight_pairs(signals.phrase_boosts),
            token_weights: weight_pairs(signals.token_weights),
            negation_regex: signals.negation_regex,
        }
    }
}

/// Clamp a weight into `[-WEIGHT_LIMIT, WEIGHT_LIMIT]`.
pub fn clamp_weight(weight: i64) -> i32 {
    // Bounded by the clamp, so the cast cannot truncate.
    weight.clamp(-i64::from(WEIGHT_LIMIT), i64::from(WEIGHT_LIMIT)) as i32
}

fn clean_term(term: &str) -> Option<String> {
    let term = term.trim();
    (!term.is_empty() && term == term.to_lowercase()).then(|| term.to_string())
}

fn clean_terms(terms: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .iter()
        .filter_map(|t| clean_term(t))
        .filter(|t| seen.insert(t.clone()))
        .take(limit)
        .collect()
}

fn clean_weights(pairs: Vec<WeightPair>, limit: usize) -> BTreeMap<String, i32> {
    let mut out = BTreeMap::new();
    for pair in pairs {
        if out.len() == limit {
            break;
        }
        if let Some(key) = clean_term(&pair.key) {
            out.entry(key).or_insert_with(|| clamp_weight(pair.weight));
        }
    }
    out
}

fn weight_pairs(map: BTreeMap<String, i32>) -> Vec<WeightPair> {
    map.into_iter()
        .map(|(key, weight)| WeightPair {
            key,
            weight: i64::from(weight),
        })
        .collect()
}
