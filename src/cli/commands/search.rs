//! repsearch search - Query the catalog

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::Result;
use crate::search::{Explanation, SearchEngine, SearchRequest};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// JSON corpus file
    #[arg(long)]
    pub corpus: PathBuf,

    /// Maximum number of results (defaults to search.default_limit)
    #[arg(long, short)]
    pub limit: Option<usize>,

    /// Free-text context passed alongside the query
    #[arg(long)]
    pub context: Option<String>,

    /// At least one top result must mention one of these words
    #[arg(long = "require")]
    pub require: Vec<String>,

    /// JSON file with the signals the completion capability should return
    #[arg(long)]
    pub signals: Option<PathBuf>,

    /// Skip signals and run classic search only
    #[arg(long)]
    pub classic: bool,

    /// Show the signals, pooling strategy and score breakdown
    #[arg(long, conflicts_with = "classic")]
    pub explain: bool,
}

#[derive(Debug, Serialize)]
struct SearchHit {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    query: String,
    mode: &'static str,
    count: usize,
    results: Vec<SearchHit>,
}

pub async fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let engine = ctx.engine(&args.corpus, args.signals.as_deref()).await?;
    let request = build_request(ctx, args);

    let cancel = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(cancel.clone());

    if args.explain {
        let explanation = engine.explain(&request, &cancel).await;
        watcher.abort();
        display_explanation(ctx, &request, explanation?)
    } else {
        let (mode, ids) = if args.classic {
            ("classic", engine.search_classic(&request.query, request.limit))
        } else {
            ("assisted", engine.search(&request, &cancel).await)
        };
        watcher.abort();
        debug!(mode, count = ids.len(), "search finished");
        display_results(ctx, &engine, &request.query, mode, &ids)
    }
}

fn build_request(ctx: &AppContext, args: &SearchArgs) -> SearchRequest {
    let mut request = SearchRequest::new(args.query.clone())
        .with_limit(args.limit.unwrap_or(ctx.config.search.default_limit));
    if let Some(context) = &args.context {
        request = request.with_context(context.clone());
    }
    if !args.require.is_empty() {
        request = request.with_required_headwords(args.require.iter().cloned());
    }
    request
}

/// Cancel `token` on Ctrl-C.
fn spawn_interrupt_watcher(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received; cancelling search");
            token.cancel();
        }
    })
}

fn display_results(
    ctx: &AppContext,
    engine: &SearchEngine,
    query: &str,
    mode: &'static str,
    ids: &[String],
) -> Result<()> {
    let results: Vec<SearchHit> = ids
        .iter()
        .map(|id| SearchHit {
            id: id.clone(),
            name: engine
                .snapshot()
                .entries()
                .iter()
                .find(|e| &e.id == id)
                .map(|e| e.display_name.clone())
                .unwrap_or_default(),
        })
        .collect();

    if ctx.robot {
        return emit_robot(&robot_ok(SearchOutput {
            query: query.to_string(),
            mode,
            count: results.len(),
            results,
        }));
    }

    let mut layout = HumanLayout::new();
    layout.title(&format!("{} results for \"{query}\" ({mode})", results.len()));
    if results.is_empty() {
        layout.push_line(style("No matching exercises").dim().to_string());
    }
    for (rank, hit) in results.iter().enumerate() {
        layout.push_line(format!(
            "{:>3}. {} {}",
            rank + 1,
            style(&hit.name).bold(),
            style(&hit.id).dim()
        ));
    }
    emit_human(&layout);
    Ok(())
}

fn display_explanation(
    ctx: &AppContext,
    request: &SearchRequest,
    explanation: Option<Explanation>,
) -> Result<()> {
    if ctx.robot {
        return emit_robot(&robot_ok(explanation));
    }

    let mut layout = HumanLayout::new();
    let Some(explanation) = explanation else {
        layout.push_line("Empty query; nothing to explain");
        emit_human(&layout);
        return Ok(());
    };

    layout.title(&format!("Explain \"{}\"", request.query));
    layout
        .kv("primary", &explanation.primary)
        .kv("headwords", &explanation.signals.headwords().join(", "))
        .kv(
            "priority",
            &explanation.signals.priority_keywords().join(", "),
        )
        .kv("banned", &explanation.signals.banned_keywords().join(", "))
        .kv(
            "negation",
            explanation.signals.negation_regex().unwrap_or("-"),
        )
        .kv(
            "strategy",
            &explanation
                .strategy
                .map_or_else(|| "none".to_string(), |s| format!("{s:?}")),
        )
        .kv("gate", if explanation.gate_passed { "pass" } else { "reject" })
        .blank()
        .section("Ranked candidates");
    for hit in &explanation.hits {
        let c = hit.components;
        layout.bullet(&format!(
            "{:<32} total {:>4}  overlap {} phrase {} banned {} brevity {}",
            hit.display_name, hit.total, c.overlap, c.phrase, c.banned, c.brevity
        ));
    }
    emit_human(&layout);
    Ok(())
}
