//! Shared types used across publish-pilot modules
//!
//! Window handles and the outcome values each workflow reports upward.

use std::fmt;

/// Opaque identifier the browser issues for one window or tab
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowHandle(String);

impl WindowHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one restore run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The backup was restored and the success marker seen
    Restored,
    /// The requested ordinal is past the end of the backup list
    IndexExhausted { index: usize, available: usize },
}

/// State of a publication as read from the status label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishState {
    InProgress,
    Success,
    Warning,
    DatabaseCorrupted,
    UnhandledError,
    Timeout,
}

impl PublishState {
    /// Screenshot tag captured when the publication ends in this state
    pub fn screenshot_tag(&self) -> Option<&'static str> {
        match self {
            PublishState::DatabaseCorrupted => Some("publication-error"),
            PublishState::Warning => Some("publication-warning"),
            PublishState::UnhandledError => Some("publication-exception"),
            PublishState::InProgress | PublishState::Success | PublishState::Timeout => None,
        }
    }
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishState::InProgress => write!(f, "in progress"),
            PublishState::Success => write!(f, "completed"),
            PublishState::Warning => write!(f, "completed with warnings"),
            PublishState::DatabaseCorrupted => write!(f, "database corrupted"),
            PublishState::UnhandledError => write!(f, "unhandled error"),
            PublishState::Timeout => write!(f, "timeout"),
        }
    }
}

/// How one restore + restore + publish cycle ended
#[derive(Debug)]
pub enum CycleOutcome {
    /// Both restores succeeded and the publication reached a terminal state
    Published(PublishState),
    /// The design site has no backup at this index; the run is over
    IndexExhausted,
    /// The cycle was aborted by a recoverable error
    Failed(crate::core::PilotError),
}

/// What a driver run did, cycle by cycle
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Number of browser sessions opened
    pub cycles: usize,
    /// Publication result per design backup index
    pub publications: Vec<(usize, PublishState)>,
    /// Aborted cycles with the error that aborted them
    pub failures: Vec<(usize, String)>,
    /// Design backup index that reported exhaustion
    pub exhausted_at: Option<usize>,
}

impl RunSummary {
    pub fn record(&mut self, index: usize, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Published(state) => self.publications.push((index, *state)),
            CycleOutcome::IndexExhausted => self.exhausted_at = Some(index),
            CycleOutcome::Failed(e) => self.failures.push((index, e.to_string())),
        }
    }
}
