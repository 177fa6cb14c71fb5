use std::sync::Arc;

use proptest::prelude::*;

use repsearch::Config;
use repsearch::search::tokenizer::{stem, tokenize};
use repsearch::search::{SearchEngine, UnavailableCompletion};
use repsearch::test_utils::fixtures::exercise_entries;

fn engine() -> SearchEngine {
    SearchEngine::from_config(
        exercise_entries(),
        Arc::new(UnavailableCompletion),
        &Config::default(),
    )
}

proptest! {
    #[test]
    fn test_tokenize_deterministic(text in ".*") {
        prop_assert_eq!(tokenize(&text), tokenize(&text));
    }

    #[test]
    fn test_classic_search_deterministic(query in "[a-z ]{0,24}", limit in 0usize..30) {
        let engine = engine();
        prop_assert_eq!(
            engine.search_classic(&query, limit),
            engine.search_classic(&query, limit)
        );
    }

    #[test]
    fn test_stem_deterministic(token in "[a-z]{1,12}") {
        prop_assert_eq!(stem(&token), stem(&token));
    }
}
