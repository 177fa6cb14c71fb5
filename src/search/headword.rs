//! Primary headword selection.
//!
//! The model lists up to three headwords in its own priority order. This
//! re-ranks them with corpus statistics and literal presence in the query so
//! the engine anchors on the single term that best represents intent.

use std::collections::HashSet;

use crate::search::index::TokenStats;
use crate::search::signals::{SearchSignals, clamp_weight};
use crate::search::tokenizer::{normalize, stem, stem_set};

/// Generic activity-type words. When the user names one explicitly it wins.
pub const FORM_WORDS: &[&str] = &[
    "workout", "exercise", "routine", "circuit", "hiit", "yoga", "cardio", "strength",
    "mobility", "stretch", "warmup", "cooldown",
];

const FORM_WORD_BONUS: i32 = 6;
const TAIL_STRONG: (f64, i32) = (0.5, 6);
const TAIL_MODERATE: (f64, i32) = (0.25, 3);
const TAIL_WEAK: (f64, i32) = (0.1, -2);
const IDF_BONUS_CAP: i32 = 4;
const POSITION_BONUS: [i32; 3] = [6, 3, 1];

pub fn is_form_word(term: &str) -> bool {
    FORM_WORDS.contains(&term)
}

/// Query text prepared once for presence checks.
#[derive(Debug, Clone)]
pub struct QueryTerms {
    pub lowered: String,
    pub tokens: Vec<String>,
    pub stems: HashSet<String>,
}

impl QueryTerms {
    pub fn new(query: &str, tokens: &[String]) -> Self {
        Self {
            lowered: normalize(query),
            tokens: tokens.to_vec(),
            stems: stem_set(tokens),
        }
    }

    /// Stem match against the tokenized query, or a raw substring match.
    pub fn mentions(&self, term: &str) -> bool {
        self.stems.contains(&stem(term)) || self.lowered.contains(term)
    }
}

/// Pick the anchor term for a query.
pub fn choose_primary(signals: &SearchSignals, query: &QueryTerms, stats: &TokenStats) -> String {
    let headwords = signals.headwords();

    if let Some(form) = headwords
        .iter()
        .find(|h| is_form_word(h) && query.mentions(h))
    {
        return form.clone();
    }

    let present: Vec<&String> = headwords.iter().filter(|h| query.mentions(h)).collect();

    let mut best: Option<(&String, i32)> = None;
    for candidate in present {
        let score = headword_score(candidate, signals, stats);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    if let Some((term, _)) = best {
        return term.clone();
    }

    signals
        .anchor_terms()
        .next()
        .map(str::to_string)
        .or_else(|| query.tokens.last().cloned())
        .unwrap_or_else(|| query.lowered.trim().to_string())
}

/// Corpus-informed score for one headword present in the query.
pub fn headword_score(term: &str, signals: &SearchSignals, stats: &TokenStats) -> i32 {
    let stemmed = stem(term);
    let mut score = 0;

    let tail = stats.tail_ratio(&stemmed);
    if tail >= TAIL_STRONG.0 {
        score += TAIL_STRONG.1;
    } else if tail >= TAIL_MODERATE.0 {
        score += TAIL_MODERATE.1;
    } else if tail <= TAIL_WEAK.0 {
        score += TAIL_WEAK.1;
    }

    let idf = stats.idf(&stemmed).round().clamp(0.0, f64::from(IDF_BONUS_CAP));
    // Bounded to [0, IDF_BONUS_CAP] above.
    score += idf as i32;

    score += signals
        .headword_position(term)
        .map_or(1, |p| POSITION_BONUS.get(p).copied().unwrap_or(1));

    if is_form_word(term) {
        score += FORM_WORD_BONUS;
    }

    if let Some(weight) = signals.token_weights().get(term) {
        score += clamp_weight(i64::from(*weight));
    }
    if let Some(weight) = signals.phrase_boosts().get(term) {
        score += clamp_weight(i64::from(*weight));
    }

    score
}
