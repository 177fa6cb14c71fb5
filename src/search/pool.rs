//! Candidate pooling.
//!
//! Three strategies are tried in order; the first non-empty pool wins.

use std::collections::BTreeSet;

use crate::catalog::CatalogSnapshot;
use crate::search::index::InvertedIndex;
use crate::search::signals::SearchSignals;
use crate::search::tokenizer::stem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStrategy {
    /// Posting list of the primary headword
    PrimaryHeadword,
    /// Union over priority keywords and context tokens
    PriorityKeywords,
    /// Union over query tokens and context tokens
    QueryOverlap,
}

/// Inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct PoolInputs<'a> {
    pub primary: &'a str,
    pub query_tokens: &'a [String],
    pub context_tokens: &'a [String],
    pub required_headwords: Option<&'a [String]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    pub strategy: PoolStrategy,
    pub positions: Vec<usize>,
}

/// Assemble the working set, or `None` when every strategy comes up empty.
pub fn build_pool(
    snapshot: &CatalogSnapshot,
    index: &InvertedIndex,
    signals: &SearchSignals,
    inputs: &PoolInputs<'_>,
) -> Option<CandidatePool> {
    let required = inputs.required_headwords.filter(|r| !r.is_empty());
    let passes_required = |position: usize| {
        required.is_none_or(|words| words.iter().any(|w| snapshot.entry_mentions(position, w)))
    };

    let primary: Vec<usize> = index
        .postings(&stem(inputs.primary))
        .iter()
        .copied()
        .filter(|&p| passes_required(p))
        .filter(|&p| shares_context(snapshot, p, inputs.context_tokens))
        .collect();
    if !primary.is_empty() {
        return Some(CandidatePool {
            strategy: PoolStrategy::PrimaryHeadword,
            positions: primary,
        });
    }

    let keywords: Vec<String> = signals
        .priority_keywords()
        .iter()
        .chain(inputs.context_tokens)
        .cloned()
        .collect();
    let by_keywords = filtered_union(index, &keywords, &passes_required);
    if !by_keywords.is_empty() {
        return Some(CandidatePool {
            strategy: PoolStrategy::PriorityKeywords,
            positions: by_keywords,
        });
    }

    let overlap_terms: Vec<String> = inputs
        .query_tokens
        .iter()
        .chain(inputs.context_tokens)
        .cloned()
        .collect();
    let by_overlap = filtered_union(index, &overlap_terms, &passes_required);
    if !by_overlap.is_empty() {
        return Some(CandidatePool {
            strategy: PoolStrategy::QueryOverlap,
            positions: by_overlap,
        });
    }

    None
}

fn filtered_union(
    index: &InvertedIndex,
    terms: &[String],
    keep: &impl Fn(usize) -> bool,
) -> Vec<usize> {
    let union: BTreeSet<usize> = index.candidate_indices(terms);
    union.into_iter().filter(|&p| keep(p)).collect()
}

/// With no context every entry passes; otherwise the entry must share a
/// stemmed token with the context or contain a context token in its name.
fn shares_context(snapshot: &CatalogSnapshot, position: usize, context_tokens: &[String]) -> bool {
    context_tokens.is_empty()
        || context_tokens
            .iter()
            .any(|token| snapshot.entry_mentions(position, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SearchableEntry;
    use crate::search::signals::RawSignals;

    fn fixture(names: &[&str]) -> (CatalogSnapshot, InvertedIndex) {
        let snapshot = CatalogSnapshot::new(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| SearchableEntry::from_name(i.to_string(), *n))
                .collect(),
        );
        let index = InvertedIndex::build(&snapshot);
        (snapshot, index)
    }

    fn signals(headwords: &[&str], priority: &[&str]) -> SearchSignals {
        SearchSignals::try_from(RawSignals {
            headwords: headwords.iter().map(|s| (*s).to_string()).collect(),
            priority_keywords: priority.iter().map(|s| (*s).to_string()).collect(),
            ..Default::default()
        })
        .expect("valid")
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    const NAMES: &[&str] = &[
        "Barbell Squat",
        "Goblet Squat",
        "Dumbbell Row",
        "Kettlebell Swing",
        "Plank",
    ];

    #[test]
    fn test_primary_headword_strategy() {
        let (snapshot, index) = fixture(NAMES);
        let query = strings(&["squats"]);
        let pool = build_pool(
            &snapshot,
            &index,
            &signals(&["squat"], &[]),
            &PoolInputs {
                primary: "squats",
                query_tokens: &query,
                context_tokens: &[],
                required_headwords: None,
            },
        )
        .expect("pool");
        assert_eq!(pool.strategy, PoolStrategy::PrimaryHeadword);
        assert_eq!(pool.positions, vec![0, 1]);
    }

    #[test]
    fn test_primary_filtered_by_context() {
        let (snapshot, index) = fixture(NAMES);
        let query = strings(&["squat"]);
        let context = strings(&["goblet"]);
        let pool = build_pool(
            &snapshot,
            &index,
            &signals(&["squat"], &[]),
            &PoolInputs {
                primary: "squat",
                query_tokens: &query,
                context_tokens: &context,
                required_headwords: None,
            },
        )
        .expect("pool");
        assert_eq!(pool.positions, vec![1]);
    }

    #[test]
    fn test_falls_back_to_priority_keywords() {
        let (snapshot, index) = fixture(NAMES);
        let query = strings(&["core"]);
        let pool = build_pool(
            &snapshot,
            &index,
            &signals(&["core"], &["plank", "swing"]),
            &PoolInputs {
                primary: "core",
                query_tokens: &query,
                context_tokens: &[],
                required_headwords: None,
            },
        )
        .expect("pool");
        assert_eq!(pool.strategy, PoolStrategy::PriorityKeywords);
        assert_eq!(pool.positions, vec![3, 4]);
    }

    #[test]
    fn test_falls_back_to_query_overlap() {
        let (snapshot, index) = fixture(NAMES);
        let query = strings(&["dumbbell", "rows"]);
        let pool = build_pool(
            &snapshot,
            &index,
            &signals(&["pull"], &["lats"]),
            &PoolInputs {
                primary: "pull",
                query_tokens: &query,
                context_tokens: &[],
                required_headwords: None,
            },
        )
        .expect("pool");
        assert_eq!(pool.strategy, PoolStrategy::QueryOverlap);
        assert_eq!(pool.positions, vec![2]);
    }

    #[test]
    fn test_required_headwords_filter_every_strategy() {
        let (snapshot, index) = fixture(NAMES);
        let query = strings(&["squat"]);
        let required = strings(&["kettlebell"]);
        let pool = build_pool(
            &snapshot,
            &index,
            &signals(&["squat"], &["swing"]),
            &PoolInputs {
                primary: "squat",
                query_tokens: &query,
                context_tokens: &[],
                required_headwords: Some(&required),
            },
        )
        .expect("pool");
        assert_eq!(pool.strategy, PoolStrategy::PriorityKeywords);
        assert_eq!(pool.positions, vec![3]);
    }

    #[test]
    fn test_all_strategies_empty() {
        let (snapshot, index) = fixture(NAMES);
        let query = strings(&["yoga"]);
        let pool = build_pool(
            &snapshot,
            &index,
            &signals(&["yoga"], &["flow"]),
            &PoolInputs {
                primary: "yoga",
                query_tokens: &query,
                context_tokens: &[],
                required_headwords: None,
            },
        );
        assert!(pool.is_none());
    }
}
