//! Corpus providers.
//!
//! The engine fetches from a provider exactly once, at construction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::SearchableEntry;
use crate::error::{Result, SearchError};

/// Source of catalog entries.
#[async_trait]
pub trait CorpusProvider: Send + Sync {
    /// Fetch every entry available right now.
    async fn fetch(&self) -> Result<Vec<SearchableEntry>>;
}

/// In-memory provider over a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticCorpus {
    entries: Vec<SearchableEntry>,
}

impl StaticCorpus {
    pub fn new(entries: Vec<SearchableEntry>) -> Self {
        Self { entries }
    }

    /// Build entries from `(id, display name)` pairs.
    pub fn from_names<I, S, T>(names: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|(id, name)| SearchableEntry::from_name(id, name))
                .collect(),
        )
    }
}

#[async_trait]
impl CorpusProvider for StaticCorpus {
    async fn fetch(&self) -> Result<Vec<SearchableEntry>> {
        Ok(self.entries.clone())
    }
}

/// Provider reading a JSON array of entries from disk.
///
/// Items need `id` and `displayName`; `normalizedName` and `tokens` are
/// derived when absent.
#[derive(Debug, Clone)]
pub struct JsonCorpus {
    path: PathBuf,
}

impl JsonCorpus {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a JSON array of entries.
    pub fn parse(raw: &str) -> Result<Vec<SearchableEntry>> {
        let entries: Vec<SearchableEntry> = serde_json::from_str(raw)?;
        Ok(entries
            .into_iter()
            .map(SearchableEntry::with_derived_fields)
            .collect())
    }
}

#[async_trait]
impl CorpusProvider for JsonCorpus {
    async fn fetch(&self) -> Result<Vec<SearchableEntry>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            SearchError::CorpusUnavailable(format!("read {}: {err}", self.path.display()))
        })?;
        Self::parse(&raw)
    }
}
