use std::sync::Arc;

use repsearch::catalog::{CorpusProvider, JsonCorpus, SearchableEntry};
use repsearch::search::{CompletionCapability, SearchEngine, SearchRequest, SignalCache};
use repsearch::test_utils::fixtures::{StubCompletion, UnitTestFixture, exercise_entries};
use repsearch::test_utils::logging::LogCapture;
use repsearch::{Config, assert_log_contains};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::Level;

fn engine(answer: Value) -> (SearchEngine, Arc<StubCompletion>) {
    let stub = Arc::new(StubCompletion::answering(answer));
    let engine = SearchEngine::from_config(
        exercise_entries(),
        Arc::clone(&stub) as Arc<dyn CompletionCapability>,
        &Config::default(),
    );
    (engine, stub)
}

fn display_names(engine: &SearchEngine, ids: &[String]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| engine.snapshot().entries().iter().find(|e| &e.id == id))
        .map(|e| e.display_name.clone())
        .collect()
}

#[tokio::test]
async fn test_search_returns_only_catalog_ids_within_limit() {
    let (engine, _) = engine(json!({"headwords": ["squat"]}));
    let ids = engine
        .search(
            &SearchRequest::new("squat").with_limit(2),
            &CancellationToken::new(),
        )
        .await;
    assert_eq!(ids.len(), 2);
    for id in &ids {
        assert!(engine.snapshot().entries().iter().any(|e| &e.id == id));
    }
}

#[tokio::test]
async fn test_banned_keyword_sinks_below_clean_matches() {
    let (engine, _) = engine(json!({"headwords": ["squat"], "bannedKeywords": ["jump"]}));
    let ids = engine
        .search(&SearchRequest::new("squat"), &CancellationToken::new())
        .await;
    let names = display_names(&engine, &ids);
    assert_eq!(names.last().map(String::as_str), Some("Squat Jump"));
    assert_eq!(names.len(), 4);
}

#[tokio::test]
async fn test_context_narrows_primary_pool() {
    let (engine, stub) = engine(json!({"headwords": ["press"]}));
    let request = SearchRequest::new("press").with_context("bench");
    let ids = engine.search(&request, &CancellationToken::new()).await;
    assert_eq!(display_names(&engine, &ids), vec!["Bench Press".to_string()]);
    let prompt = stub.last_prompt().expect("prompt recorded");
    assert!(prompt.contains("Context: bench"));
}

#[tokio::test]
async fn test_fallback_is_logged() {
    let capture = LogCapture::start("repsearch=debug");
    let (engine, _) = engine(json!({"priorityKeywords": ["squat"]}));
    let ids = engine
        .search(&SearchRequest::new("plank"), &CancellationToken::new())
        .await;
    assert_eq!(ids, engine.search_classic("plank", 50));
    assert_log_contains!(capture, Level::WARN, "falling back to classic search");
}

#[tokio::test]
async fn test_cancellation_is_logged_and_empty() {
    let capture = LogCapture::start("repsearch=info");
    let (engine, stub) = engine(json!({"headwords": ["squat"]}));
    let token = CancellationToken::new();
    token.cancel();
    assert!(engine.search(&SearchRequest::new("squat"), &token).await.is_empty());
    assert_eq!(stub.calls(), 0);
    assert_log_contains!(capture, Level::INFO, "search cancelled");
}

#[tokio::test]
async fn test_shared_cache_spans_engines() {
    let stub = Arc::new(StubCompletion::answering(json!({"headwords": ["plank"]})));
    let cache = Arc::new(SignalCache::new(4));
    let build = || {
        SearchEngine::new(
            exercise_entries(),
            repsearch::search::SignalGenerator::new(
                Arc::clone(&stub) as Arc<dyn CompletionCapability>,
                Arc::clone(&cache),
                repsearch::search::SamplingOptions::from(&Config::default().completion),
            ),
            Config::default().search,
        )
    };
    let first = build();
    let second = build();
    let request = SearchRequest::new("plank");
    let a = first.search(&request, &CancellationToken::new()).await;
    let b = second.search(&request, &CancellationToken::new()).await;
    assert_eq!(a, b);
    assert_eq!(stub.calls(), 1);
    assert_eq!(cache.stats().hits, 1);
}

#[tokio::test]
async fn test_concurrent_queries_share_one_engine() {
    let (engine, _) = engine(json!({"headwords": ["row"]}));
    let engine = Arc::new(engine);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .search(&SearchRequest::new("row"), &CancellationToken::new())
                .await
        }));
    }
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("join"));
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert!(!results[0].is_empty());
}

#[tokio::test]
async fn test_engine_from_json_corpus() {
    let fixture = UnitTestFixture::new();
    let path = fixture.create_corpus();
    let provider = JsonCorpus::new(&path);
    let entries: Vec<SearchableEntry> = provider.fetch().await.expect("fetch");
    assert_eq!(entries.len(), 20);

    let stub = Arc::new(StubCompletion::answering(json!({"headwords": ["curl"]})));
    let engine = SearchEngine::from_provider(&provider, stub, &Config::default()).await;
    let ids = engine
        .search(&SearchRequest::new("hammer curl"), &CancellationToken::new())
        .await;
    assert_eq!(
        display_names(&engine, &ids),
        vec!["Dumbbell Hammer Curl".to_string()]
    );
}
