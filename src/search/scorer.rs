//! Relevance scoring.
//!
//! A score is the sum of four integer components. Before scoring, the model's
//! phrase and token weights are rescaled by corpus IDF so rare, distinctive
//! terms count for more than common ones.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::catalog::SearchableEntry;
use crate::config::SearchConfig;
use crate::search::headword::QueryTerms;
use crate::search::index::TokenStats;
use crate::search::signals::{SearchSignals, WEIGHT_LIMIT};
use crate::search::tokenizer::stem;

/// Per-candidate score breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreComponents {
    /// Shared stemmed tokens between query and entry
    pub overlap: u32,
    /// Anchor, phrase-boost and token-weight adjustments
    pub phrase: i32,
    /// Zero or negative
    pub banned: i32,
    /// Zero or negative
    pub brevity: i32,
}

impl ScoreComponents {
    pub fn total(&self) -> i64 {
        i64::from(self.overlap)
            + i64::from(self.phrase)
            + i64::from(self.banned)
            + i64::from(self.brevity)
    }
}

/// Number of stems the query and entry have in common.
pub fn overlap(query_stems: &HashSet<String>, entry_stems: &HashSet<String>) -> u32 {
    let (small, large) = if query_stems.len() <= entry_stems.len() {
        (query_stems, entry_stems)
    } else {
        (entry_stems, query_stems)
    };
    let shared = small.iter().filter(|s| large.contains(*s)).count();
    u32::try_from(shared).unwrap_or(u32::MAX)
}

/// Phrase boosts and token weights after anchor flooring and IDF rescaling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoringWeights {
    pub phrase_boosts: BTreeMap<String, i32>,
    pub token_weights: BTreeMap<String, i32>,
}

impl ScoringWeights {
    /// Floor the anchors (the primary headword and every headword the query
    /// mentions literally), then rescale every weight by its clamped IDF.
    pub fn derive(
        signals: &SearchSignals,
        primary: &str,
        query: &QueryTerms,
        stats: &TokenStats,
        config: &SearchConfig,
    ) -> Self {
        let mut phrase_boosts = signals.phrase_boosts().clone();
        let mut token_weights = signals.token_weights().clone();

        let anchors = std::iter::once(primary).chain(
            signals
                .headwords()
                .iter()
                .map(String::as_str)
                .filter(|h| query.mentions(h)),
        );
        for anchor in anchors {
            for map in [&mut phrase_boosts, &mut token_weights] {
                let floor = config.anchor_weight_floor;
                map.entry(anchor.to_string())
                    .and_modify(|w| *w = (*w).max(floor))
                    .or_insert(floor);
            }
        }

        rescale(&mut token_weights, stats, config.token_idf_clamp);
        rescale(&mut phrase_boosts, stats, config.phrase_idf_clamp);

        Self {
            phrase_boosts,
            token_weights,
        }
    }
}

fn rescale(weights: &mut BTreeMap<String, i32>, stats: &TokenStats, [lo, hi]: [f64; 2]) {
    for (key, weight) in weights.iter_mut() {
        let factor = stats.key_idf(key).clamp(lo, hi);
        let scaled = (f64::from(*weight) * factor)
            .round()
            .clamp(-f64::from(WEIGHT_LIMIT), f64::from(WEIGHT_LIMIT));
        // Clamped into the weight range above.
        *weight = scaled as i32;
    }
}

/// Scores candidates for one query.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    pub query: &'a QueryTerms,
    pub signals: &'a SearchSignals,
    pub weights: &'a ScoringWeights,
    pub primary: &'a str,
    pub primary_stem: &'a str,
    pub config: &'a SearchConfig,
}

impl Scorer<'_> {
    pub fn score(&self, entry: &SearchableEntry, entry_stems: &HashSet<String>) -> ScoreComponents {
        let name = entry.normalized_name.as_str();

        let mut phrase = 0;
        if name.contains(self.primary) || entry_stems.contains(self.primary_stem) {
            phrase += self.config.anchor_bonus;
        } else if self.query.lowered.contains(self.primary) {
            phrase -= self.config.anchor_bonus;
        }
        for (text, weight) in &self.weights.phrase_boosts {
            if name.contains(text.as_str()) {
                phrase += weight;
            }
        }
        for (token, weight) in &self.weights.token_weights {
            if name.contains(token.as_str()) || entry_stems.contains(&stem(token)) {
                phrase += weight;
            }
        }

        let banned = if name
            .split(' ')
            .any(|word| self.signals.banned_keywords().iter().any(|b| b == word))
        {
            -self.config.banned_penalty
        } else {
            0
        };

        let divisor = self.config.brevity_divisor.max(1);
        let brevity = -i32::try_from(entry.token_count() / divisor).unwrap_or(i32::MAX);

        ScoreComponents {
            overlap: overlap(&self.query.stems, entry_stems),
            phrase,
            banned,
            brevity,
        }
    }
}
