//! Signal generation: prompt, completion, validation, caching.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::search::cache::SignalCache;
use crate::search::completion::{
    CompletionCapability, CompletionError, CompletionRequest, SamplingOptions, signal_schema,
};
use crate::search::signals::{
    MAX_HEADWORDS, MAX_KEYWORDS, MAX_TOKEN_WEIGHTS, RawSignals, SearchSignals, WEIGHT_LIMIT,
};

/// Produces validated [`SearchSignals`] for a query, consulting the cache first.
#[derive(Clone)]
pub struct SignalGenerator {
    capability: Arc<dyn CompletionCapability>,
    cache: Arc<SignalCache>,
    schema: Arc<Value>,
    sampling: SamplingOptions,
}

impl SignalGenerator {
    pub fn new(
        capability: Arc<dyn CompletionCapability>,
        cache: Arc<SignalCache>,
        sampling: SamplingOptions,
    ) -> Self {
        Self {
            capability,
            cache,
            schema: Arc::new(signal_schema()),
            sampling,
        }
    }

    pub fn cache(&self) -> &Arc<SignalCache> {
        &self.cache
    }

    /// Return signals for `(query, context)`.
    ///
    /// A cache hit short-circuits the completion call. On a miss the answer is
    /// validated before it is cached; invalid answers are never stored.
    /// Cancellation is reported as [`SearchError::Cancelled`] without retry.
    pub async fn generate(
        &self,
        query: &str,
        context: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SearchSignals> {
        let key = SignalCache::key(query, context);
        if let Some(signals) = self.cache.get(&key) {
            debug!(key = %key, "signal cache hit");
            return Ok(signals);
        }

        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let request = CompletionRequest {
            prompt: build_prompt(query, context),
            schema: Arc::clone(&self.schema),
            sampling: self.sampling,
        };

        let answer = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SearchError::Cancelled),
            answer = self.capability.complete(request) => answer,
        };
        let answer = match answer {
            Ok(answer) => answer,
            Err(CompletionError::Cancelled) => return Err(SearchError::Cancelled),
            Err(err) => return Err(err.into()),
        };

        let raw: RawSignals = serde_json::from_value(answer)
            .map_err(|err| CompletionError::Malformed(err.to_string()))?;
        let signals = SearchSignals::try_from(raw)?;

        self.cache.put(&key, &signals);
        debug!(
            key = %key,
            headwords = ?signals.headwords(),
            "signals generated"
        );
        Ok(signals)
    }
}

impl std::fmt::Debug for SignalGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalGenerator")
            .field("cache", &self.cache)
            .field("sampling", &self.sampling)
            .finish_non_exhaustive()
    }
}

/// Prompt asking for lexical signals only, as a single JSON object.
pub fn build_prompt(query: &str, context: Option<&str>) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You extract lexical search signals for an exercise catalog. \
         Catalog entries are short exercise names such as \"Barbell Back Squat\" \
         or \"Incline Dumbbell Press\".\n\n",
    );
    prompt.push_str(&format!("Query: {query}\n"));
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("Context: {context}\n"));
    }
    prompt.push_str(&format!(
        "\nReturn ONLY a JSON object with these fields, all strings lowercase:\n\
         - headwords: 1 to {MAX_HEADWORDS} core exercise terms, most important first\n\
         - priorityKeywords: up to {MAX_KEYWORDS} words that should appear in good matches\n\
         - bannedKeywords: up to {MAX_KEYWORDS} words that indicate a wrong match\n\
         - synonyms: list of {{key, values}} alternative names\n\
         - phraseBoosts: list of {{key, weight}} phrases, \
         weight from -{WEIGHT_LIMIT} to {WEIGHT_LIMIT}\n\
         - tokenWeights: up to {MAX_TOKEN_WEIGHTS} {{key, weight}} single words, \
         weight from -{WEIGHT_LIMIT} to {WEIGHT_LIMIT}\n\
         - negationRegex: a pattern matching names the user excluded (\"no machine\"), or null\n"
    ));
    prompt
}
