//! Inverted index and corpus-wide token statistics.
//!
//! Both are built once from a [`CatalogSnapshot`] and are read-only afterward,
//! so any number of queries may share them.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::catalog::CatalogSnapshot;
use crate::search::tokenizer::{stem, stem_all, tokenize};

/// Stemmed token -> snapshot positions containing it.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<usize>>,
}

impl InvertedIndex {
    /// Build postings in O(total tokens). Each entry appears at most once per
    /// posting list, and posting lists are in ascending position order.
    pub fn build(snapshot: &CatalogSnapshot) -> Self {
        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, entry) in snapshot.entries().iter().enumerate() {
            let mut seen = HashSet::new();
            for token in &entry.tokens {
                let stemmed = stem(token);
                if seen.insert(stemmed.clone()) {
                    postings.entry(stemmed).or_default().push(position);
                }
            }
        }
        Self { postings }
    }

    /// Posting list for an already-stemmed token.
    pub fn postings(&self, stemmed: &str) -> &[usize] {
        self.postings.get(stemmed).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, stemmed: &str) -> bool {
        self.postings.contains_key(stemmed)
    }

    /// Number of distinct stemmed tokens.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Union of the posting lists for `tokens`, each stemmed before lookup.
    ///
    /// Low precision, high recall: used when nothing narrower matched.
    pub fn candidate_indices<S: AsRef<str>>(&self, tokens: &[S]) -> BTreeSet<usize> {
        tokens
            .iter()
            .flat_map(|t| self.postings(&stem(t.as_ref())).iter().copied())
            .collect()
    }

    /// Terms ordered by descending document frequency, then alphabetically.
    pub fn top_terms(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut terms: Vec<(&str, usize)> = self
            .postings
            .iter()
            .map(|(term, list)| (term.as_str(), list.len()))
            .collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(limit);
        terms
    }
}

/// Corpus-wide document and tail frequencies over stemmed tokens.
#[derive(Debug, Clone)]
pub struct TokenStats {
    document_frequency: HashMap<String, usize>,
    tail_frequency: HashMap<String, usize>,
    total_documents: usize,
}

impl TokenStats {
    pub fn compute(snapshot: &CatalogSnapshot) -> Self {
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut tail_frequency: HashMap<String, usize> = HashMap::new();
        for (position, entry) in snapshot.entries().iter().enumerate() {
            for stemmed in snapshot.stems(position) {
                *document_frequency.entry(stemmed.clone()).or_default() += 1;
            }
            if let Some(last) = entry.tokens.last() {
                *tail_frequency.entry(stem(last)).or_default() += 1;
            }
        }
        Self {
            document_frequency,
            tail_frequency,
            total_documents: snapshot.len().max(1),
        }
    }

    /// Always at least 1.
    pub const fn total_documents(&self) -> usize {
        self.total_documents
    }

    pub fn document_frequency(&self, stemmed: &str) -> usize {
        self.document_frequency.get(stemmed).copied().unwrap_or(0)
    }

    pub fn tail_frequency(&self, stemmed: &str) -> usize {
        self.tail_frequency.get(stemmed).copied().unwrap_or(0)
    }

    /// `log2(N / max(1, df))` for a stemmed token.
    pub fn idf(&self, stemmed: &str) -> f64 {
        let df = self.document_frequency(stemmed).max(1);
        (self.total_documents as f64 / df as f64).log2()
    }

    /// IDF of a free-form key. Multi-word keys use their most common token,
    /// since a phrase never occurs in more entries than its rarest word.
    pub fn key_idf(&self, key: &str) -> f64 {
        let stems = stem_all(&tokenize(key));
        match stems.as_slice() {
            [] => self.idf(&stem(key)),
            [single] => self.idf(single),
            many => many
                .iter()
                .map(|s| self.idf(s))
                .fold(f64::INFINITY, f64::min),
        }
    }

    /// Share of the entries containing `stemmed` whose last token stems to it.
    pub fn tail_ratio(&self, stemmed: &str) -> f64 {
        let df = self.document_frequency(stemmed);
        if df == 0 {
            return 0.0;
        }
        self.tail_frequency(stemmed) as f64 / df as f64
    }
}
