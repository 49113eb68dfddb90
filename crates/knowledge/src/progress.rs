//! Structured progress reporting for pipeline operations.
//!
//! The pipeline never prints; callers that want feedback pass a reporter
//! with a callback and render the events themselves.

use std::sync::Arc;
use std::time::Instant;

/// Pipeline phase an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Crawl,
    Embed,
    Index,
    Answer,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Crawl => "crawl",
            Phase::Embed => "embed",
            Phase::Index => "index",
            Phase::Answer => "answer",
        }
    }
}

/// Progress event emitted during pipeline operations.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,

    /// Work done so far (pages fetched, chunks embedded, ...)
    pub current: u64,

    /// Total expected work, if known
    pub total: Option<u64>,

    /// Human-readable message
    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: Phase,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    /// Percentage complete, when the total is known.
    pub fn percentage(&self) -> Option<f64> {
        self.total.map(|t| {
            if t > 0 {
                (self.current as f64 / t as f64) * 100.0
            } else {
                0.0
            }
        })
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => format!("{}", self.current),
        };

        let pct = self
            .percentage()
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase.as_str(), progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// A reporter that drops every event.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    pub fn emit(&self, mut event: ProgressEvent) {
        let Some(callback) = &self.callback else {
            return;
        };

        let elapsed = self.start_time.elapsed().as_secs_f64();
        event.elapsed_secs = Some(elapsed);

        tracing::debug!(
            phase = event.phase.as_str(),
            current = event.current,
            total = ?event.total,
            message = %event.message,
            elapsed_secs = elapsed,
            "Progress event"
        );

        callback(event);
    }

    /// A page was fetched (or skipped).
    pub fn crawl(&self, current: u64, total: Option<u64>, url: &str) {
        self.emit(ProgressEvent::new(Phase::Crawl, current, total, url.to_string()));
    }

    /// A batch of chunks was embedded.
    pub fn embed(&self, current: u64, total: u64, model: &str) {
        self.emit(ProgressEvent::new(
            Phase::Embed,
            current,
            Some(total),
            format!("model={}", model),
        ));
    }

    /// Records were written to a collection.
    pub fn index(&self, current: u64, total: u64, collection: &str) {
        self.emit(ProgressEvent::new(
            Phase::Index,
            current,
            Some(total),
            format!("collection={}", collection),
        ));
    }

    /// A question was answered from `documents` retrieved chunks.
    pub fn answer(&self, documents: u64) {
        self.emit(ProgressEvent::new(
            Phase::Answer,
            documents,
            None,
            "retrieved documents",
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("enabled", &self.callback.is_some())
            .finish()
    }
}
