use repsearch::search::tokenizer::{expand_plural_variants, normalize, stem, tokenize};
use repsearch::test_utils::{TestCase, run_table_tests};

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn tokenize_cases() -> Result<(), String> {
    let cases = vec![
        TestCase::new("punctuation splits", "Push-Up (Wide)", words(&["push", "up", "wide"])),
        TestCase::new("diacritics fold", "Développé Couché", words(&["developpe", "couche"])),
        TestCase::new("digits kept", "90/90 Hip Switch", words(&["90", "90", "hip", "switch"])),
        TestCase::new("blank", "  --  ", Vec::new()),
    ];
    run_table_tests(cases, tokenize)
}

#[test]
fn stem_cases() -> Result<(), String> {
    let cases = vec![
        TestCase::new("ies", "flies", "fly".to_string()),
        TestCase::new("es", "lunges", "lung".to_string()),
        TestCase::new("s", "squats", "squat".to_string()),
        TestCase::new("no suffix", "plank", "plank".to_string()),
        TestCase::new("never empties", "s", "s".to_string()),
    ];
    run_table_tests(cases, stem)
}

#[test]
fn plural_variants_cover_both_directions() {
    let variants = expand_plural_variants(&["row", "lunges"]);
    for expected in ["row", "rows", "lunges", "lunge"] {
        assert!(variants.iter().any(|v| v == expected), "missing {expected}");
    }
    assert_eq!(normalize("ÉLAN"), "elan");
}
