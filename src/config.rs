use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("REPSEARCH_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(project_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a complete or partial TOML document over the defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let patch: ConfigPatch = toml::from_str(raw)?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let path = dirs::config_dir()
            .ok_or_else(|| SearchError::MissingConfig("config directory not found".to_string()))?
            .join("repsearch/config.toml");
        Self::load_patch(&path)
    }

    fn load_project(project_root: &Path) -> Result<Option<ConfigPatch>> {
        let path = project_root.join("repsearch.toml");
        Self::load_patch(&path)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SearchError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| SearchError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.cache {
            self.cache.merge(patch);
        }
        if let Some(patch) = patch.completion {
            self.completion.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if env_bool("REPSEARCH_CACHE_DISABLED").unwrap_or(false) {
            self.cache.enabled = false;
        }

        if let Some(value) = env_usize("REPSEARCH_SEARCH_DEFAULT_LIMIT")? {
            self.search.default_limit = value;
        }
        if let Some(value) = env_usize("REPSEARCH_SEARCH_GATE_WINDOW")? {
            self.search.gate_window = value;
        }
        if let Some(value) = env_i32("REPSEARCH_SEARCH_ANCHOR_BONUS")? {
            self.search.anchor_bonus = value;
        }
        if let Some(value) = env_i32("REPSEARCH_SEARCH_BANNED_PENALTY")? {
            self.search.banned_penalty = value;
        }
        if let Some(value) = env_usize("REPSEARCH_SEARCH_BREVITY_DIVISOR")? {
            self.search.brevity_divisor = value;
        }
        if let Some(value) = env_i32("REPSEARCH_SEARCH_ANCHOR_WEIGHT_FLOOR")? {
            self.search.anchor_weight_floor = value;
        }

        if let Some(value) = env_bool("REPSEARCH_CACHE_ENABLED") {
            self.cache.enabled = value;
        }
        if let Some(value) = env_usize("REPSEARCH_CACHE_CAPACITY")? {
            self.cache.capacity = value;
        }

        if let Some(value) = env_f32("REPSEARCH_COMPLETION_TEMPERATURE")? {
            self.completion.temperature = value;
        }
        if let Some(value) = env_u32("REPSEARCH_COMPLETION_MAX_OUTPUT_TOKENS")? {
            self.completion.max_output_tokens = value;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.search.validate()
    }
}

/// Empirically tuned ranking constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    /// How many top-ranked results the satisfaction gate inspects
    pub gate_window: usize,
    /// Bonus (or penalty) for containing (or missing) the primary headword
    pub anchor_bonus: i32,
    /// Penalty for a name word that exactly matches a banned keyword
    pub banned_penalty: i32,
    /// One brevity point is lost per this many name tokens
    pub brevity_divisor: usize,
    /// Minimum weight for the primary headword and query-literal headwords
    pub anchor_weight_floor: i32,
    pub token_idf_clamp: [f64; 2],
    pub phrase_idf_clamp: [f64; 2],
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            gate_window: 10,
            anchor_bonus: 6,
            banned_penalty: 6,
            brevity_divisor: 10,
            anchor_weight_floor: 2,
            token_idf_clamp: [0.25, 3.0],
            phrase_idf_clamp: [0.5, 2.5],
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.gate_window == 0 {
            return Err(SearchError::Config(
                "search.gate_window must be at least 1".to_string(),
            ));
        }
        if self.brevity_divisor == 0 {
            return Err(SearchError::Config(
                "search.brevity_divisor must be at least 1".to_string(),
            ));
        }
        for (name, [lo, hi]) in [
            ("search.token_idf_clamp", self.token_idf_clamp),
            ("search.phrase_idf_clamp", self.phrase_idf_clamp),
        ] {
            if !(lo <= hi) {
                return Err(SearchError::Config(format!(
                    "{name} lower bound {lo} exceeds upper bound {hi}"
                )));
            }
        }
        Ok(())
    }

    /// Repair values [`Self::validate`] would reject: zero counts and NaN
    /// bounds fall back to the defaults, inverted bounds are swapped.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.gate_window == 0 {
            self.gate_window = defaults.gate_window;
        }
        if self.brevity_divisor == 0 {
            self.brevity_divisor = defaults.brevity_divisor;
        }
        self.token_idf_clamp = sane_bounds(self.token_idf_clamp, defaults.token_idf_clamp);
        self.phrase_idf_clamp = sane_bounds(self.phrase_idf_clamp, defaults.phrase_idf_clamp);
        self
    }

    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.default_limit {
            self.default_limit = value;
        }
        if let Some(value) = patch.gate_window {
            self.gate_window = value;
        }
        if let Some(value) = patch.anchor_bonus {
            self.anchor_bonus = value;
        }
        if let Some(value) = patch.banned_penalty {
            self.banned_penalty = value;
        }
        if let Some(value) = patch.brevity_divisor {
            self.brevity_divisor = value;
        }
        if let Some(value) = patch.anchor_weight_floor {
            self.anchor_weight_floor = value;
        }
        if let Some(value) = patch.token_idf_clamp {
            self.token_idf_clamp = value;
        }
        if let Some(value) = patch.phrase_idf_clamp {
            self.phrase_idf_clamp = value;
        }
    }
}

fn sane_bounds([lo, hi]: [f64; 2], fallback: [f64; 2]) -> [f64; 2] {
    if lo.is_nan() || hi.is_nan() {
        fallback
    } else if lo > hi {
        [hi, lo]
    } else {
        [lo, hi]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: crate::search::cache::DEFAULT_SIGNAL_CACHE_SIZE,
        }
    }
}

impl CacheConfig {
    fn merge(&mut self, patch: CachePatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.capacity {
            self.capacity = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 512,
        }
    }
}

impl CompletionConfig {
    fn merge(&mut self, patch: CompletionPatch) {
        if let Some(value) = patch.temperature {
            self.temperature = value;
        }
        if let Some(value) = patch.max_output_tokens {
            self.max_output_tokens = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub search: Option<SearchPatch>,
    pub cache: Option<CachePatch>,
    pub completion: Option<CompletionPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub default_limit: Option<usize>,
    pub gate_window: Option<usize>,
    pub anchor_bonus: Option<i32>,
    pub banned_penalty: Option<i32>,
    pub brevity_divisor: Option<usize>,
    pub anchor_weight_floor: Option<i32>,
    pub token_idf_clamp: Option<[f64; 2]>,
    pub phrase_idf_clamp: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CachePatch {
    pub enabled: Option<bool>,
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CompletionPatch {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.parse::<T>().map(Some).map_err(|err| {
            SearchError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    env_parse(key)
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    env_parse(key)
}

fn env_i32(key: &str) -> Result<Option<i32>> {
    env_parse(key)
}

fn env_f32(key: &str) -> Result<Option<f32>> {
    env_parse(key)
}
