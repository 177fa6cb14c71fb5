//! Completion capability seam.
//!
//! The engine never talks to a model runtime directly. It hands a prompt, the
//! fixed signal schema and sampling options to a [`CompletionCapability`] and
//! gets back a JSON value that should conform to the schema.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::CompletionConfig;
use crate::search::signals::{
    MAX_HEADWORDS, MAX_KEYWORDS, MAX_PHRASE_BOOSTS, MAX_SYNONYM_KEYS, MAX_SYNONYM_VALUES,
    MAX_TOKEN_WEIGHTS, WEIGHT_LIMIT,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("completion cancelled")]
    Cancelled,
    #[error("completion capability unavailable: {0}")]
    Unavailable(String),
    #[error("malformed completion output: {0}")]
    Malformed(String),
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl From<&CompletionConfig> for SamplingOptions {
    fn from(config: &CompletionConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// One structured completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub schema: Arc<Value>,
    pub sampling: SamplingOptions,
}

/// Turns a prompt into a schema-conformant JSON answer.
#[async_trait]
pub trait CompletionCapability: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Value, CompletionError>;
}

/// JSON schema describing the signal answer.
pub fn signal_schema() -> Value {
    let weight_list = |max_items: usize| {
        json!({
            "type": "array",
            "maxItems": max_items,
            "items": {
                "type": "object",
                "required": ["key", "weight"],
                "properties": {
                    "key": { "type": "string" },
                    "weight": {
                        "type": "integer",
                        "minimum": -WEIGHT_LIMIT,
                        "maximum": WEIGHT_LIMIT
                    }
                }
            }
        })
    };
    let string_list = |max_items: usize| {
        json!({ "type": "array", "maxItems": max_items, "items": { "type": "string" } })
    };

    json!({
        "type": "object",
        "required": ["headwords"],
        "properties": {
            "headwords": {
                "type": "array",
                "minItems": 1,
                "maxItems": MAX_HEADWORDS,
                "items": { "type": "string" }
            },
            "priorityKeywords": string_list(MAX_KEYWORDS),
            "bannedKeywords": string_list(MAX_KEYWORDS),
            "synonyms": {
                "type": "array",
                "maxItems": MAX_SYNONYM_KEYS,
                "items": {
                    "type": "object",
                    "required": ["key", "values"],
                    "properties": {
                        "key": { "type": "string" },
                        "values": string_list(MAX_SYNONYM_VALUES)
                    }
                }
            },
            "phraseBoosts": weight_list(MAX_PHRASE_BOOSTS),
            "tokenWeights": weight_list(MAX_TOKEN_WEIGHTS),
            "negationRegex": { "type": ["string", "null"] }
        }
    })
}

/// Capability that always answers with the same JSON value.
#[derive(Debug, Clone)]
pub struct ReplayCompletion {
    answer: Value,
}

impl ReplayCompletion {
    pub const fn new(answer: Value) -> Self {
        Self { answer }
    }

    /// Parse the fixed answer from JSON text.
    pub fn from_json(raw: &str) -> crate::error::Result<Self> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }
}

#[async_trait]
impl CompletionCapability for ReplayCompletion {
    async fn complete(&self, _request: CompletionRequest) -> Result<Value, CompletionError> {
        Ok(self.answer.clone())
    }
}

/// Capability that always fails, routing every query to classic search.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCompletion;

#[async_trait]
impl CompletionCapability for UnavailableCompletion {
    async fn complete(&self, _request: CompletionRequest) -> Result<Value, CompletionError> {
        Err(CompletionError::Unavailable(
            "no completion capability configured".to_string(),
        ))
    }
}
