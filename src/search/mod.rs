//! Assisted exercise search.
//!
//! A language model proposes lexical signals for a query; a deterministic
//! pipeline pools, scores, filters and ranks catalog entries with them.
//! [`classic`] is the signal-free path used as a fallback.

pub mod cache;
pub mod classic;
pub mod completion;
pub mod engine;
pub mod generator;
pub mod headword;
pub mod index;
pub mod pool;
pub mod rank;
pub mod scorer;
pub mod signals;
pub mod tokenizer;

pub use cache::{CacheStats, SignalCache};
pub use completion::{
    CompletionCapability, CompletionError, CompletionRequest, ReplayCompletion, SamplingOptions,
    UnavailableCompletion,
};
pub use engine::{DEFAULT_LIMIT, ExplainedHit, Explanation, SearchEngine, SearchRequest};
pub use generator::SignalGenerator;
pub use index::{InvertedIndex, TokenStats};
pub use pool::PoolStrategy;
pub use scorer::ScoreComponents;
pub use signals::{RawSignals, SearchSignals, SignalError};
