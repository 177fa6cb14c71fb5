use repsearch::config::Config;
use repsearch::test_utils::{TestCase, run_table_tests};

#[test]
fn config_search_section_from_toml() -> Result<(), String> {
    let cases = vec![
        TestCase::new(
            "empty document keeps defaults",
            "",
            (50usize, 10usize, 6i32, 10usize),
        ),
        TestCase::new(
            "partial search section",
            "[search]\ndefault_limit = 20\ngate_window = 5\n",
            (20, 5, 6, 10),
        ),
        TestCase::new(
            "ranking constants",
            "[search]\nanchor_bonus = 8\nbrevity_divisor = 4\n",
            (50, 10, 8, 4),
        ),
    ];

    run_table_tests(cases, |raw| {
        let config = Config::from_toml(raw).expect("parse config");
        (
            config.search.default_limit,
            config.search.gate_window,
            config.search.anchor_bonus,
            config.search.brevity_divisor,
        )
    })
}

#[test]
fn config_cache_and_completion_from_toml() -> Result<(), String> {
    let cases = vec![
        TestCase::new("defaults", "", (true, 256usize, 512u32)),
        TestCase::new(
            "disabled cache",
            "[cache]\nenabled = false\ncapacity = 8\n",
            (false, 8, 512),
        ),
        TestCase::new(
            "completion budget",
            "[completion]\nmax_output_tokens = 256\n",
            (true, 256, 256),
        ),
    ];

    run_table_tests(cases, |raw| {
        let config = Config::from_toml(raw).expect("parse config");
        (
            config.cache.enabled,
            config.cache.capacity,
            config.completion.max_output_tokens,
        )
    })
}

#[test]
fn config_rejects_invalid_values() -> Result<(), String> {
    let cases = vec![
        TestCase::new("zero brevity divisor", "[search]\nbrevity_divisor = 0\n", true),
        TestCase::new("zero gate window", "[search]\ngate_window = 0\n", true),
        TestCase::new(
            "inverted clamp",
            "[search]\ntoken_idf_clamp = [3.0, 0.25]\n",
            true,
        ),
        TestCase::new("unterminated table", "[search\n", true),
        TestCase::new("valid", "[search]\ngate_window = 3\n", false),
    ];

    run_table_tests(cases, |raw| Config::from_toml(raw).is_err())
}
