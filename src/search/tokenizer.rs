//! Tokenization and suffix stemming.
//!
//! Pure functions shared by index construction, scoring and both query paths.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Lowercase `text` and fold diacritics ("Développé" -> "developpe").
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Split `text` into normalized, non-empty tokens on non-alphanumeric runs.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Strip a plural suffix. Rules fire in order: `ies` -> `y`, `es` -> ``, `s` -> ``.
///
/// A token that would be emptied by stripping is returned unchanged.
pub fn stem(token: &str) -> String {
    if let Some(base) = token.strip_suffix("ies") {
        return format!("{base}y");
    }
    if let Some(base) = token.strip_suffix("es") {
        if !base.is_empty() {
            return base.to_string();
        }
    }
    if let Some(base) = token.strip_suffix('s') {
        if !base.is_empty() {
            return base.to_string();
        }
    }
    token.to_string()
}

/// Stem every token, keeping order and duplicates.
pub fn stem_all<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens.iter().map(|t| stem(t.as_ref())).collect()
}

/// Stem every token into a set.
pub fn stem_set<S: AsRef<str>>(tokens: &[S]) -> HashSet<String> {
    tokens.iter().map(|t| stem(t.as_ref())).collect()
}

/// The alternate plural form of a single token, if one is plausible.
pub fn plural_variant(token: &str) -> Option<String> {
    if token.len() > 1 {
        if let Some(base) = token.strip_suffix('s') {
            return Some(base.to_string());
        }
        if let Some(base) = token.strip_suffix('y') {
            return Some(format!("{base}ies"));
        }
    }
    if token.is_empty() {
        None
    } else {
        Some(format!("{token}s"))
    }
}

/// Union of `tokens` and their plural/singular variants, first occurrence wins.
pub fn expand_plural_variants<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for token in tokens {
        let token = token.as_ref();
        for candidate in std::iter::once(token.to_string()).chain(plural_variant(token)) {
            if seen.insert(candidate.clone()) {
                out.push(candidate);
            }
        }
    }
    out
}
