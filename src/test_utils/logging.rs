//! Scoped log capture for assertions on tracing output.
//!
//! A [`LogCapture`] installs a thread-local subscriber for its lifetime, so
//! parallel tests never see each other's events. `#[tokio::test]` runs on a
//! current-thread runtime, which keeps async work on the capturing thread.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const MAX_ENTRIES: usize = 1000;

/// A captured event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct LogStorage {
    entries: VecDeque<LogEntry>,
}

impl LogStorage {
    fn push(&mut self, entry: LogEntry) {
        if self.entries.len() >= MAX_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

struct CaptureLayer {
    storage: Arc<Mutex<LogStorage>>,
}

impl<S> tracing_subscriber::Layer<S> for CaptureLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        struct Visitor<'a> {
            message: &'a mut String,
            fields: &'a mut Vec<(String, String)>,
        }

        impl tracing::field::Visit for Visitor<'_> {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    *self.message = value.to_string();
                } else {
                    self.fields.push((field.name().to_string(), value.to_string()));
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                let value = format!("{value:?}");
                if field.name() == "message" {
                    *self.message = value;
                } else {
                    self.fields.push((field.name().to_string(), value));
                }
            }
        }

        let metadata = event.metadata();
        let mut message = String::new();
        let mut fields = Vec::new();
        event.record(&mut Visitor {
            message: &mut message,
            fields: &mut fields,
        });

        self.storage.lock().push(LogEntry {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message,
            fields,
        });
    }
}

/// Captures events at `level` and above until dropped. On a panicking drop
/// the captured events are printed to stderr.
pub struct LogCapture {
    storage: Arc<Mutex<LogStorage>>,
    _guard: DefaultGuard,
}

impl LogCapture {
    pub fn start(level: &str) -> Self {
        let storage = Arc::new(Mutex::new(LogStorage::default()));
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new(level))
            .with(CaptureLayer {
                storage: Arc::clone(&storage),
            });
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            storage,
            _guard: guard,
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.storage.lock().entries.iter().cloned().collect()
    }

    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.storage
            .lock()
            .entries
            .iter()
            .any(|e| e.level == level && e.message.contains(message))
    }

    pub fn count(&self, level: Level) -> usize {
        self.storage
            .lock()
            .entries
            .iter()
            .filter(|e| e.level == level)
            .count()
    }

    pub fn has_warnings(&self) -> bool {
        self.count(Level::WARN) > 0
    }

    pub fn clear(&self) {
        self.storage.lock().entries.clear();
    }

    pub fn format_for_display(&self) -> String {
        let entries = self.entries();
        if entries.is_empty() {
            return String::from("No logs captured");
        }
        let mut out = format!("Captured {} log entries:\n", entries.len());
        for entry in entries {
            let _ = writeln!(out, "[{}] {}: {}", entry.level, entry.target, entry.message);
            for (key, value) in &entry.fields {
                let _ = writeln!(out, "    {key} = {value}");
            }
        }
        out
    }
}

impl Drop for LogCapture {
    fn drop(&mut self) {
        if std::thread::panicking() {
            eprintln!("{}", self.format_for_display());
        }
    }
}

/// Assert that `capture` recorded an event at `level` containing `message`.
#[macro_export]
macro_rules! assert_log_contains {
    ($capture:expr, $level:expr, $message:expr) => {{
        assert!(
            $capture.contains($level, $message),
            "Expected log with level {} containing '{}'\n{}",
            $level,
            $message,
            $capture.format_for_display()
        );
    }};
}

/// Assert that `capture` recorded no warnings.
#[macro_export]
macro_rules! assert_no_warnings {
    ($capture:expr) => {{
        assert!(
            !$capture.has_warnings(),
            "Expected no warnings\n{}",
            $capture.format_for_display()
        );
    }};
}
