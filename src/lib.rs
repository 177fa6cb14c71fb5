//! repsearch - lexical search over an exercise catalog.
//!
//! The engine builds an inverted index from a read-only catalog snapshot and
//! answers free-text queries through two paths:
//!
//! - an assisted path that asks an external completion capability for lexical
//!   signals (headwords, keyword weights, a negation pattern), then pools,
//!   scores, filters and ranks candidates;
//! - a classic path that intersects posting lists deterministically.

pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod search;
pub mod test_utils;

pub use config::Config;
pub use error::{Result, SearchError};
pub use search::{SearchEngine, SearchRequest};
