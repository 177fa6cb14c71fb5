use std::sync::Arc;

use repsearch::Config;
use repsearch::search::{SearchEngine, UnavailableCompletion};
use repsearch::test_utils::fixtures::{EXERCISE_NAMES, exercise_entries, exercise_id};
use repsearch::test_utils::{TestCase, run_table_tests};

fn engine() -> SearchEngine {
    SearchEngine::from_config(
        exercise_entries(),
        Arc::new(UnavailableCompletion),
        &Config::default(),
    )
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn name_of(id: &str) -> String {
    EXERCISE_NAMES
        .iter()
        .enumerate()
        .find(|(i, _)| exercise_id(*i) == id)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_default()
}

#[test]
fn classic_search_orderings() -> Result<(), String> {
    let cases = vec![
        TestCase::new(
            "shared headword ordered by length then name",
            ("squat", 10usize),
            names(&["Barbell Squat", "Front Squat", "Goblet Squat", "Squat Jump"]),
        ),
        TestCase::new(
            "plural query matches singular names",
            ("lunges", 10),
            names(&["Reverse Lunges", "Walking Lunge"]),
        ),
        TestCase::new(
            "singular query matches plural names",
            ("row", 10),
            names(&["Barbell Row", "Machine Row", "Seated Cable Rows"]),
        ),
        TestCase::new(
            "intersection narrows",
            ("push up", 10),
            names(&["Push Up", "Push Up Variation"]),
        ),
        TestCase::new(
            "unknown trailing token falls back to first",
            ("plank zercher", 10),
            names(&["Plank", "Side Plank"]),
        ),
        TestCase::new("unknown leading token", ("zercher plank", 10), Vec::new()),
        TestCase::new("empty query", ("", 10), Vec::new()),
        TestCase::new("limit truncates", ("squat", 1), names(&["Barbell Squat"])),
    ];

    run_table_tests(cases, |(query, limit)| {
        engine()
            .search_classic(query, limit)
            .iter()
            .map(|id| name_of(id))
            .collect::<Vec<_>>()
    })
}

#[test]
fn classic_search_ignores_case_and_diacritics() {
    let engine = engine();
    assert_eq!(
        engine.search_classic("GOBLET Squat", 10),
        engine.search_classic("goblet squat", 10)
    );
    assert_eq!(
        engine.search_classic("plánk", 10),
        engine.search_classic("plank", 10)
    );
}
