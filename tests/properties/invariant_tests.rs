use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use repsearch::Config;
use repsearch::catalog::{CatalogSnapshot, SearchableEntry};
use repsearch::search::tokenizer::{stem, tokenize};
use repsearch::search::{InvertedIndex, SearchEngine, SearchRequest, UnavailableCompletion};
use repsearch::test_utils::fixtures::{StubCompletion, exercise_entries};

fn catalog_ids() -> HashSet<String> {
    exercise_entries().into_iter().map(|e| e.id).collect()
}

proptest! {
    #[test]
    fn test_stem_never_empties_or_grows(token in "[a-z]{1,12}") {
        let stemmed = stem(&token);
        prop_assert!(!stemmed.is_empty());
        prop_assert!(stemmed.len() <= token.len());
    }

    #[test]
    fn test_tokens_are_lowercase_alphanumeric(text in "[a-zA-ZÀ-ÿ0-9 ,.'-]{0,40}") {
        for token in tokenize(&text) {
            prop_assert!(!token.is_empty());
            prop_assert!(token.chars().all(char::is_alphanumeric));
            prop_assert_eq!(token.to_lowercase(), token.clone());
        }
    }

    #[test]
    fn test_index_covers_every_entry_token(
        names in prop::collection::vec("[a-z]{1,8}( [a-z]{1,8}){0,3}", 1..12)
    ) {
        let snapshot = CatalogSnapshot::new(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| SearchableEntry::from_name(i.to_string(), n.as_str()))
                .collect(),
        );
        let index = InvertedIndex::build(&snapshot);
        for (position, entry) in snapshot.entries().iter().enumerate() {
            for token in &entry.tokens {
                prop_assert!(index.postings(&stem(token)).contains(&position));
            }
        }
    }

    #[test]
    fn test_classic_results_are_catalog_ids_within_limit(
        query in "[a-z ]{0,24}",
        limit in 0usize..30,
    ) {
        let engine = SearchEngine::from_config(
            exercise_entries(),
            Arc::new(UnavailableCompletion),
            &Config::default(),
        );
        let ids = engine.search_classic(&query, limit);
        let catalog = catalog_ids();
        prop_assert!(ids.len() <= limit);
        prop_assert!(ids.iter().all(|id| catalog.contains(id)));
        let unique: HashSet<&String> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_assisted_results_are_catalog_ids_within_limit(
        query in "[a-z]{1,8}( [a-z]{1,8}){0,2}",
        headword in "[a-z]{1,8}",
        limit in 1usize..20,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let stub = Arc::new(StubCompletion::answering(json!({
            "headwords": [headword],
            "bannedKeywords": ["machine"],
        })));
        let engine = SearchEngine::from_config(exercise_entries(), stub, &Config::default());
        let ids = runtime.block_on(engine.search(
            &SearchRequest::new(query).with_limit(limit),
            &CancellationToken::new(),
        ));
        let catalog = catalog_ids();
        prop_assert!(ids.len() <= limit);
        prop_assert!(ids.iter().all(|id| catalog.contains(id)));
    }
}
