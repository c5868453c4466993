// Copyright 2025 Cowboy AI, LLC.

//! Diagnostic events
//!
//! The deserializer never aborts on a bad field; it reports what happened to
//! an [`EventSink`] and carries on. Sinks are fire-and-forget: recording an
//! event never changes the outcome of a call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Severity of a diagnostic event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventLevel {
    /// Informational note
    Note,
    /// Data was kept but not where it was expected
    Warning,
    /// Data was dropped or an object was not reconstructed faithfully
    Error,
    /// The call could not do anything useful
    Critical,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventLevel::Note => write!(f, "Note"),
            EventLevel::Warning => write!(f, "Warning"),
            EventLevel::Error => write!(f, "Error"),
            EventLevel::Critical => write!(f, "Critical"),
        }
    }
}

/// A recorded diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier of the event
    pub id: Uuid,
    /// Severity
    pub level: EventLevel,
    /// Human readable message
    pub message: String,
    /// Messages of the underlying causes, outermost first
    pub causes: Vec<String>,
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Create an event
    pub fn new(level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            causes: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create a note
    pub fn note(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Note, message)
    }

    /// Create a warning
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Warning, message)
    }

    /// Create an error
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Error, message)
    }

    /// Create an event from an error, keeping its source chain
    pub fn from_error(level: EventLevel, error: &(dyn std::error::Error + 'static)) -> Self {
        let mut event = Self::new(level, error.to_string());
        let mut source = error.source();
        while let Some(cause) = source {
            event.causes.push(cause.to_string());
            source = cause.source();
        }
        event
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)?;
        for cause in &self.causes {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

/// Receiver of diagnostic events
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    /// Record an event
    fn record(&self, event: Event);
}

fn emit(event: &Event) {
    match event.level {
        EventLevel::Note => tracing::info!(id = %event.id, "{}", event),
        EventLevel::Warning => tracing::warn!(id = %event.id, "{}", event),
        EventLevel::Error | EventLevel::Critical => tracing::error!(id = %event.id, "{}", event),
    }
}

/// Sink that only forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: Event) {
        emit(&event);
    }
}

#[derive(Debug, Default)]
struct EventLogState {
    all: Vec<Event>,
    current: Vec<Event>,
}

/// Sink that keeps every event in memory
///
/// Events are also forwarded to `tracing`. The log distinguishes the full
/// history from the current batch, which callers drain with
/// [`take_current`](EventLog::take_current) after each top-level call.
#[derive(Debug, Default)]
pub struct EventLog {
    state: Mutex<EventLogState>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut EventLogState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Record an error together with its source chain
    pub fn record_error(&self, level: EventLevel, error: &(dyn std::error::Error + 'static)) {
        self.record(Event::from_error(level, error));
    }

    /// Every event recorded since creation or the last [`clear`](EventLog::clear)
    pub fn all_events(&self) -> Vec<Event> {
        self.with_state(|s| s.all.clone())
    }

    /// Events of the current batch, without draining them
    pub fn current_events(&self) -> Vec<Event> {
        self.with_state(|s| s.current.clone())
    }

    /// Drain the current batch
    pub fn take_current(&self) -> Vec<Event> {
        self.with_state(|s| std::mem::take(&mut s.current))
    }

    /// Number of recorded events at `level`
    pub fn count(&self, level: EventLevel) -> usize {
        self.with_state(|s| s.all.iter().filter(|e| e.level == level).count())
    }

    /// Recorded warnings
    pub fn warnings(&self) -> Vec<Event> {
        self.at_level(EventLevel::Warning)
    }

    /// Recorded errors, including critical ones
    pub fn errors(&self) -> Vec<Event> {
        self.with_state(|s| {
            s.all
                .iter()
                .filter(|e| e.level >= EventLevel::Error)
                .cloned()
                .collect()
        })
    }

    /// Check if any error was recorded
    pub fn has_errors(&self) -> bool {
        self.with_state(|s| s.all.iter().any(|e| e.level >= EventLevel::Error))
    }

    /// Forget all events
    pub fn clear(&self) {
        self.with_state(|s| {
            s.all.clear();
            s.current.clear();
        });
    }

    fn at_level(&self, level: EventLevel) -> Vec<Event> {
        self.with_state(|s| s.all.iter().filter(|e| e.level == level).cloned().collect())
    }
}

impl EventSink for EventLog {
    fn record(&self, event: Event) {
        emit(&event);
        self.with_state(|s| {
            s.current.push(event.clone());
            s.all.push(event);
        });
    }
}
