//! Search engine facade.
//!
//! Owns the snapshot, index, token statistics and signal generator. The
//! snapshot and index are immutable after construction, so one engine can
//! serve concurrent queries; the signal cache is the only shared mutable
//! state and guards itself.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogSnapshot, CorpusProvider, SearchableEntry};
use crate::config::{Config, SearchConfig};
use crate::error::{Result, SearchError};
use crate::search::cache::SignalCache;
use crate::search::classic;
use crate::search::completion::{CompletionCapability, SamplingOptions};
use crate::search::generator::SignalGenerator;
use crate::search::headword::{QueryTerms, choose_primary};
use crate::search::index::{InvertedIndex, TokenStats};
use crate::search::pool::{CandidatePool, PoolInputs, PoolStrategy, build_pool};
use crate::search::rank::{NegationFilter, SatisfactionGate, Scored, rank};
use crate::search::scorer::{ScoreComponents, Scorer, ScoringWeights};
use crate::search::signals::SearchSignals;
use crate::search::tokenizer::{normalize, stem, stem_set, tokenize};

/// Default number of identifiers returned.
pub const DEFAULT_LIMIT: usize = 50;

/// One assisted-search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub context: Option<String>,
    pub required_headwords: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: DEFAULT_LIMIT,
            context: None,
            required_headwords: None,
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_required_headwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_headwords = Some(words.into_iter().map(Into::into).collect());
        self
    }
}

/// Pipeline stage boundaries where cancellation is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prompt,
    Signals,
    Pooling,
    Scoring,
    Ranking,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Signals => "signals",
            Self::Pooling => "pooling",
            Self::Scoring => "scoring",
            Self::Ranking => "ranking",
        }
    }
}

fn checkpoint(cancel: &CancellationToken, stage: Stage) -> Result<()> {
    if cancel.is_cancelled() {
        debug!(stage = stage.as_str(), "cancellation checkpoint tripped");
        return Err(SearchError::Cancelled);
    }
    Ok(())
}

/// Everything derived from the query and its signals before pooling.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub query: QueryTerms,
    pub context_tokens: Vec<String>,
    pub required_headwords: Option<Vec<String>>,
    pub signals: SearchSignals,
    pub primary: String,
    pub primary_stem: String,
    pub weights: ScoringWeights,
    pub limit: usize,
}

/// One ranked hit with its score breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ExplainedHit {
    pub id: String,
    pub display_name: String,
    pub components: ScoreComponents,
    pub total: i64,
}

/// Diagnostic view of one assisted query.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub signals: SearchSignals,
    pub primary: String,
    pub weights: ScoringWeights,
    pub strategy: Option<PoolStrategy>,
    pub gate_passed: bool,
    pub hits: Vec<ExplainedHit>,
}

pub struct SearchEngine {
    snapshot: CatalogSnapshot,
    index: InvertedIndex,
    stats: TokenStats,
    generator: SignalGenerator,
    config: SearchConfig,
}

impl SearchEngine {
    /// Build the snapshot, index and statistics from `entries`. Ranking
    /// constants that would break scoring are repaired first.
    pub fn new(
        entries: Vec<SearchableEntry>,
        generator: SignalGenerator,
        config: SearchConfig,
    ) -> Self {
        if let Err(err) = config.validate() {
            warn!(error = %err, "repairing search config");
        }
        let config = config.sanitized();
        let snapshot = CatalogSnapshot::new(entries);
        let index = InvertedIndex::build(&snapshot);
        let stats = TokenStats::compute(&snapshot);
        debug!(
            entries = snapshot.len(),
            terms = index.term_count(),
            "search index built"
        );
        Self {
            snapshot,
            index,
            stats,
            generator,
            config,
        }
    }

    /// Build with a cache and sampling options taken from `config`.
    pub fn from_config(
        entries: Vec<SearchableEntry>,
        capability: Arc<dyn CompletionCapability>,
        config: &Config,
    ) -> Self {
        let generator = SignalGenerator::new(
            capability,
            Arc::new(SignalCache::from_config(&config.cache)),
            SamplingOptions::from(&config.completion),
        );
        Self::new(entries, generator, config.search.clone())
    }

    /// Fetch the corpus once. A failed fetch yields an engine over an empty
    /// snapshot that answers every query with no results.
    pub async fn from_provider(
        provider: &dyn CorpusProvider,
        capability: Arc<dyn CompletionCapability>,
        config: &Config,
    ) -> Self {
        let entries = match provider.fetch().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "corpus unavailable; starting with an empty catalog");
                Vec::new()
            }
        };
        Self::from_config(entries, capability, config)
    }

    pub const fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    pub const fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub const fn stats(&self) -> &TokenStats {
        &self.stats
    }

    pub fn signal_cache(&self) -> &Arc<SignalCache> {
        self.generator.cache()
    }

    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Assisted search. Never fails: cancellation yields no results and a
    /// signal-generation failure falls back to [`Self::search_classic`].
    pub async fn search(&self, request: &SearchRequest, cancel: &CancellationToken) -> Vec<String> {
        match self.run(request, cancel).await {
            Ok(ids) => ids,
            Err(err) if err.is_cancelled() => {
                info!(query = %request.query, "search cancelled");
                Vec::new()
            }
            Err(err) => {
                warn!(
                    query = %request.query,
                    error = %err,
                    "signal generation failed; falling back to classic search"
                );
                self.search_classic(&request.query, request.limit)
            }
        }
    }

    /// Deterministic search without signals.
    pub fn search_classic(&self, query: &str, limit: usize) -> Vec<String> {
        self.ids(classic::search_positions(&self.snapshot, &self.index, query, limit))
    }

    /// Run the assisted pipeline without the gate and report every stage.
    pub async fn explain(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<Explanation>> {
        let Some(plan) = self.plan(request, cancel).await? else {
            return Ok(None);
        };
        let pool = self.collect(&plan, cancel)?;
        let strategy = pool.as_ref().map(|p| p.strategy);
        let scored = self.score(&plan, pool, cancel)?;
        let ranked = self.order(&plan, scored, cancel)?;
        let gate_passed = self.gate(&plan).accepts(&self.snapshot, &ranked);

        let hits = ranked
            .iter()
            .take(plan.limit)
            .filter_map(|s| {
                self.snapshot.get(s.position).map(|entry| ExplainedHit {
                    id: entry.id.clone(),
                    display_name: entry.display_name.clone(),
                    components: s.components,
                    total: s.components.total(),
                })
            })
            .collect();

        Ok(Some(Explanation {
            primary: plan.primary.clone(),
            weights: plan.weights.clone(),
            signals: plan.signals,
            strategy,
            gate_passed,
            hits,
        }))
    }

    async fn run(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let Some(plan) = self.plan(request, cancel).await? else {
            return Ok(Vec::new());
        };
        let pool = self.collect(&plan, cancel)?;
        let scored = self.score(&plan, pool, cancel)?;
        self.finish(&plan, scored, cancel)
    }

    /// Tokenize, obtain signals, choose the primary headword and derive the
    /// scoring weights. `None` for a blank query.
    pub(crate) async fn plan(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<QueryPlan>> {
        let query_text = request.query.trim();
        if query_text.is_empty() || request.limit == 0 {
            return Ok(None);
        }

        let tokens = tokenize(query_text);
        let context = request
            .context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let context_tokens = context.map(tokenize).unwrap_or_default();
        let required_headwords = request.required_headwords.as_ref().map(|words| {
            words
                .iter()
                .map(|w| normalize(w.trim()))
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
        });
        let query = QueryTerms::new(query_text, &tokens);

        checkpoint(cancel, Stage::Prompt)?;
        let signals = self.generator.generate(query_text, context, cancel).await?;
        checkpoint(cancel, Stage::Signals)?;

        let primary = choose_primary(&signals, &query, &self.stats);
        let primary_stem = stem(&primary);
        let weights = ScoringWeights::derive(&signals, &primary, &query, &self.stats, &self.config);
        debug!(primary = %primary, headwords = ?signals.headwords(), "primary headword chosen");

        Ok(Some(QueryPlan {
            query,
            context_tokens,
            required_headwords,
            signals,
            primary,
            primary_stem,
            weights,
            limit: request.limit,
        }))
    }

    pub(crate) fn collect(
        &self,
        plan: &QueryPlan,
        cancel: &CancellationToken,
    ) -> Result<Option<CandidatePool>> {
        checkpoint(cancel, Stage::Pooling)?;
        let pool = build_pool(
            &self.snapshot,
            &self.index,
            &plan.signals,
            &PoolInputs {
                primary: &plan.primary,
                query_tokens: &plan.query.tokens,
                context_tokens: &plan.context_tokens,
                required_headwords: plan.required_headwords.as_deref(),
            },
        );
        match &pool {
            Some(pool) => debug!(
                strategy = ?pool.strategy,
                candidates = pool.positions.len(),
                "candidate pool built"
            ),
            None => debug!("every pooling strategy came up empty"),
        }
        Ok(pool)
    }

    pub(crate) fn score(
        &self,
        plan: &QueryPlan,
        pool: Option<CandidatePool>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Scored>> {
        checkpoint(cancel, Stage::Scoring)?;
        let Some(pool) = pool else {
            return Ok(Vec::new());
        };
        let scorer = Scorer {
            query: &plan.query,
            signals: &plan.signals,
            weights: &plan.weights,
            primary: &plan.primary,
            primary_stem: &plan.primary_stem,
            config: &self.config,
        };
        Ok(pool
            .positions
            .into_iter()
            .filter_map(|position| {
                self.snapshot.get(position).map(|entry| Scored {
                    position,
                    components: scorer.score(entry, self.snapshot.stems(position)),
                })
            })
            .collect())
    }

    /// Negation filter then ranking.
    fn order(
        &self,
        plan: &QueryPlan,
        scored: Vec<Scored>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Scored>> {
        checkpoint(cancel, Stage::Ranking)?;
        let filter = NegationFilter::new(plan.signals.negation_regex());
        let kept = filter.apply(&self.snapshot, &plan.signals, scored);
        Ok(rank(&self.snapshot, kept))
    }

    pub(crate) fn finish(
        &self,
        plan: &QueryPlan,
        scored: Vec<Scored>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let ranked = self.order(plan, scored, cancel)?;
        if !self.gate(plan).accepts(&self.snapshot, &ranked) {
            debug!(query = %plan.query.lowered, "satisfaction gate discarded results");
            return Ok(Vec::new());
        }
        Ok(self.ids(ranked.into_iter().take(plan.limit).map(|s| s.position)))
    }

    fn gate<'a>(&'a self, plan: &'a QueryPlan) -> GateInputs<'a> {
        let mut lexical_stems: HashSet<String> = plan.query.stems.clone();
        lexical_stems.extend(stem_set(&plan.context_tokens));
        GateInputs {
            lexical_stems,
            required_headwords: plan.required_headwords.as_deref(),
            window: self.config.gate_window,
        }
    }

    fn ids(&self, positions: impl IntoIterator<Item = usize>) -> Vec<String> {
        positions
            .into_iter()
            .filter_map(|p| self.snapshot.get(p).map(|e| e.id.clone()))
            .collect()
    }
}

/// Owned inputs for a [`SatisfactionGate`].
struct GateInputs<'a> {
    lexical_stems: HashSet<String>,
    required_headwords: Option<&'a [String]>,
    window: usize,
}

impl GateInputs<'_> {
    fn accepts(&self, snapshot: &CatalogSnapshot, ranked: &[Scored]) -> bool {
        SatisfactionGate {
            lexical_stems: &self.lexical_stems,
            required_headwords: self.required_headwords,
            window: self.window,
        }
        .accepts(snapshot, ranked)
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("entries", &self.snapshot.len())
            .field("terms", &self.index.term_count())
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}
