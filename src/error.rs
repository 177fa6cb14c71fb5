//! Error types for repsearch.
//!
//! Internal pipeline stages propagate [`SearchError`]; the public query API on
//! [`crate::search::SearchEngine`] recovers every variant locally and reports
//! only the absence of results.

use thiserror::Error;

use crate::search::completion::CompletionError;
use crate::search::signals::SignalError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("toml parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// The corpus provider could not deliver a snapshot.
    #[error("corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// A cooperative cancellation checkpoint tripped.
    #[error("search cancelled")]
    Cancelled,

    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("invalid search signals: {0}")]
    InvalidSignals(#[from] SignalError),

    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

impl SearchError {
    /// True for cancellation, whether raised by a checkpoint or by the
    /// completion capability itself.
    pub const fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Completion(CompletionError::Cancelled)
        )
    }
}
