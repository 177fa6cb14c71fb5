//! Classic (non-assisted) search.
//!
//! Deterministic and synchronous: a perfect-match intersection over the query
//! tokens (each widened with its plural variant), falling back to the posting
//! list of the first token.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::catalog::CatalogSnapshot;
use crate::search::index::InvertedIndex;
use crate::search::rank::compare_names;
use crate::search::scorer::overlap;
use crate::search::tokenizer::{expand_plural_variants, stem, tokenize};

/// Ranked snapshot positions for `query`.
pub fn search_positions(
    snapshot: &CatalogSnapshot,
    index: &InvertedIndex,
    query: &str,
    limit: usize,
) -> Vec<usize> {
    let mut seen = HashSet::new();
    let tokens: Vec<String> = tokenize(query)
        .into_iter()
        .filter(|t| seen.insert(stem(t)))
        .collect();
    if tokens.is_empty() || limit == 0 {
        return Vec::new();
    }
    let query_stems = seen;

    let groups: Vec<Option<BTreeSet<usize>>> = tokens
        .iter()
        .map(|token| variant_postings(index, token))
        .collect();

    let perfect = if groups.iter().all(Option::is_some) {
        intersect(groups.iter().flatten())
    } else {
        BTreeSet::new()
    };

    let (kind, candidates) = if perfect.is_empty() {
        let first = groups.first().cloned().flatten().unwrap_or_default();
        ("first_token", first)
    } else {
        ("perfect_match", perfect)
    };
    debug!(kind, candidates = candidates.len(), "classic candidates");

    let mut ranked: Vec<(usize, u32)> = candidates
        .into_iter()
        .map(|p| (p, overlap(&query_stems, snapshot.stems(p))))
        .collect();
    ranked.sort_by(|(pa, oa), (pb, ob)| {
        ob.cmp(oa).then_with(|| match (snapshot.get(*pa), snapshot.get(*pb)) {
            (Some(a), Some(b)) => a
                .token_count()
                .cmp(&b.token_count())
                .then_with(|| compare_names(a, b)),
            _ => pa.cmp(pb),
        })
    });
    ranked.truncate(limit);
    ranked.into_iter().map(|(p, _)| p).collect()
}

/// Union of postings over every plural/singular spelling of `token`, raw or
/// stemmed. `None` if no spelling is indexed.
fn variant_postings(index: &InvertedIndex, token: &str) -> Option<BTreeSet<usize>> {
    let variants = expand_plural_variants(&[token.to_string(), stem(token)]);
    let keys: BTreeSet<String> = variants
        .iter()
        .flat_map(|v| [v.clone(), stem(v)])
        .filter(|key| index.contains(key))
        .collect();
    if keys.is_empty() {
        return None;
    }
    Some(
        keys.iter()
            .flat_map(|key| index.postings(key).iter().copied())
            .collect(),
    )
}

fn intersect<'a>(mut sets: impl Iterator<Item = &'a BTreeSet<usize>>) -> BTreeSet<usize> {
    let Some(first) = sets.next() else {
        return BTreeSet::new();
    };
    sets.fold(first.clone(), |acc, set| acc.intersection(set).copied().collect())
}
