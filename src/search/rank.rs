//! Negation filtering, ranking and the satisfaction gate.

use std::cmp::Ordering;
use std::collections::HashSet;

use regex::Regex;
use tracing::warn;

use crate::catalog::{CatalogSnapshot, SearchableEntry};
use crate::search::scorer::ScoreComponents;
use crate::search::signals::SearchSignals;

/// A candidate with its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    pub position: usize,
    pub components: ScoreComponents,
}

/// Exclusion pattern supplied with the signals.
///
/// An uncompilable pattern matches nothing.
#[derive(Debug, Clone)]
pub struct NegationFilter {
    pattern: Option<Regex>,
}

impl NegationFilter {
    pub fn new(pattern: Option<&str>) -> Self {
        let pattern = pattern.filter(|p| !p.is_empty()).and_then(|p| match Regex::new(p) {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(pattern = p, error = %err, "ignoring malformed negation pattern");
                None
            }
        });
        Self { pattern }
    }

    pub const fn is_active(&self) -> bool {
        self.pattern.is_some()
    }

    /// True if `entry` should be dropped. The regex only runs on names that
    /// mention a headword or priority keyword.
    pub fn excludes(&self, entry: &SearchableEntry, signals: &SearchSignals) -> bool {
        let Some(pattern) = &self.pattern else {
            return false;
        };
        let name = entry.normalized_name.as_str();
        if !signals.anchor_terms().any(|term| name.contains(term)) {
            return false;
        }
        pattern.is_match(name)
    }

    pub fn apply(
        &self,
        snapshot: &CatalogSnapshot,
        signals: &SearchSignals,
        scored: Vec<Scored>,
    ) -> Vec<Scored> {
        if !self.is_active() {
            return scored;
        }
        scored
            .into_iter()
            .filter(|s| {
                snapshot
                    .get(s.position)
                    .is_none_or(|entry| !self.excludes(entry, signals))
            })
            .collect()
    }
}

/// Ascending name order: folded name, then display name, then id.
pub fn compare_names(a: &SearchableEntry, b: &SearchableEntry) -> Ordering {
    a.normalized_name
        .cmp(&b.normalized_name)
        .then_with(|| a.display_name.cmp(&b.display_name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort descending by total score, ties by name.
pub fn rank(snapshot: &CatalogSnapshot, mut scored: Vec<Scored>) -> Vec<Scored> {
    scored.sort_by(|a, b| {
        b.components
            .total()
            .cmp(&a.components.total())
            .then_with(|| match (snapshot.get(a.position), snapshot.get(b.position)) {
                (Some(ea), Some(eb)) => compare_names(ea, eb),
                _ => a.position.cmp(&b.position),
            })
    });
    scored
}

/// Post-ranking sanity check over the top of the list.
#[derive(Debug, Clone, Copy)]
pub struct SatisfactionGate<'a> {
    /// Stemmed query tokens plus stemmed context tokens
    pub lexical_stems: &'a HashSet<String>,
    pub required_headwords: Option<&'a [String]>,
    pub window: usize,
}

impl SatisfactionGate<'_> {
    /// False when the ranked list should be discarded.
    pub fn accepts(&self, snapshot: &CatalogSnapshot, ranked: &[Scored]) -> bool {
        let top = &ranked[..ranked.len().min(self.window)];

        if !self.lexical_stems.is_empty()
            && !top.iter().any(|s| {
                snapshot
                    .stems(s.position)
                    .iter()
                    .any(|stem| self.lexical_stems.contains(stem))
            })
        {
            return false;
        }

        if let Some(required) = self.required_headwords.filter(|r| !r.is_empty()) {
            let satisfied = top.iter().any(|s| {
                required
                    .iter()
                    .any(|word| snapshot.entry_mentions(s.position, word))
            });
            if !satisfied {
                return false;
            }
        }

        true
    }
}
