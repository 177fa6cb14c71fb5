//! repsearch stats - Corpus and index statistics

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::Result;
use crate::search::SearchEngine;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// JSON corpus file
    #[arg(long)]
    pub corpus: PathBuf,

    /// Number of most frequent terms to list
    #[arg(long, default_value = "10")]
    pub top: usize,
}

#[derive(Debug, Serialize, PartialEq)]
struct TermStat {
    term: String,
    documents: usize,
    tail: usize,
    idf: f64,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    entries: usize,
    terms: usize,
    cache_capacity: usize,
    top_terms: Vec<TermStat>,
}

pub async fn run(ctx: &AppContext, args: &StatsArgs) -> Result<()> {
    let engine = ctx.engine(&args.corpus, None).await?;
    let output = collect(&engine, args.top);

    if ctx.robot {
        return emit_robot(&robot_ok(output));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Catalog statistics")
        .kv("entries", &output.entries.to_string())
        .kv("indexed terms", &output.terms.to_string())
        .kv("cache capacity", &output.cache_capacity.to_string())
        .blank()
        .section("Most frequent terms");
    for term in &output.top_terms {
        layout.bullet(&format!(
            "{:<20} docs {:>4}  tail {:>4}  idf {:.2}",
            term.term, term.documents, term.tail, term.idf
        ));
    }
    emit_human(&layout);
    Ok(())
}

fn collect(engine: &SearchEngine, top: usize) -> StatsOutput {
    let stats = engine.stats();
    let top_terms = engine
        .index()
        .top_terms(top)
        .into_iter()
        .map(|(term, documents)| TermStat {
            term: term.to_string(),
            documents,
            tail: stats.tail_frequency(term),
            idf: stats.idf(term),
        })
        .collect();
    StatsOutput {
        entries: engine.snapshot().len(),
        terms: engine.index().term_count(),
        cache_capacity: engine.signal_cache().capacity(),
        top_terms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::search::UnavailableCompletion;
    use crate::test_utils::fixtures::exercise_entries;
    use std::sync::Arc;

    #[test]
    fn test_collect_reports_most_frequent_terms() {
        let engine = SearchEngine::from_config(
            exercise_entries(),
            Arc::new(UnavailableCompletion),
            &Config::default(),
        );
        let output = collect(&engine, 2);
        assert_eq!(output.entries, 20);
        assert_eq!(output.cache_capacity, 256);
        assert_eq!(output.top_terms.len(), 2);
        assert_eq!(output.top_terms[0].term, "squat");
        assert_eq!(output.top_terms[0].documents, 4);
        assert_eq!(output.top_terms[0].tail, 3);
    }
}
