use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::catalog::SearchableEntry;
use crate::search::completion::{CompletionCapability, CompletionError, CompletionRequest};

/// Small exercise catalog covering plurals, shared headwords and names that
/// a negation pattern should drop.
pub const EXERCISE_NAMES: &[&str] = &[
    "Barbell Squat",
    "Goblet Squat",
    "Front Squat",
    "Squat Jump",
    "Box Jump",
    "Walking Lunge",
    "Reverse Lunges",
    "Barbell Row",
    "Seated Cable Rows",
    "Machine Row",
    "Machine Chest Press",
    "Bench Press",
    "Push Up",
    "Push Up Variation",
    "Plank",
    "Side Plank",
    "Kettlebell Swing",
    "Hip Flexor Stretch",
    "Dumbbell Hammer Curl",
    "Yoga Flow",
];

/// Identifier assigned to `EXERCISE_NAMES[position]`.
pub fn exercise_id(position: usize) -> String {
    format!("ex-{position:03}")
}

pub fn exercise_entries() -> Vec<SearchableEntry> {
    EXERCISE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| SearchableEntry::from_name(exercise_id(i), *name))
        .collect()
}

/// The exercise catalog as the JSON document a corpus file would hold.
pub fn exercise_corpus_json() -> String {
    let items: Vec<Value> = EXERCISE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| serde_json::json!({"id": exercise_id(i), "displayName": name}))
        .collect();
    Value::Array(items).to_string()
}

/// Completion capability with a fixed answer that records how it was called.
pub struct StubCompletion {
    answer: Result<Value, CompletionError>,
    cancel_on_call: Option<CancellationToken>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubCompletion {
    pub fn answering(answer: Value) -> Self {
        Self {
            answer: Ok(answer),
            cancel_on_call: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing(error: CompletionError) -> Self {
        Self {
            answer: Err(error),
            cancel_on_call: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Cancel `token` from inside the completion call, then answer normally.
    #[must_use]
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_call = Some(token);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().clone()
    }
}

#[async_trait]
impl CompletionCapability for StubCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<Value, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock() = Some(request.prompt);
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        self.answer.clone()
    }
}

/// Test fixture providing isolated filesystem environment.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            data_path,
        }
    }

    /// Create a test file with content.
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Write the exercise catalog as `corpus.json`.
    #[must_use]
    pub fn create_corpus(&self) -> PathBuf {
        self.create_file("corpus.json", &exercise_corpus_json())
    }
}
