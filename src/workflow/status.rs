//! Publication status classification
//!
//! The console reports publication progress as free text in a label. The
//! text is matched by substring, first match wins:
//!
//! 1. "Publish site database corrupted" -> database corrupted
//! 2. "Completed with Warnings"         -> warning
//! 3. "Completed successfully"          -> success
//! 4. "oops" (any case)                 -> unhandled error
//! 5. an unnamed window is open         -> dismiss the popup
//! 6. anything else                     -> still in progress
//!
//! Corruption is checked before "oops" so a data-integrity failure is never
//! reported as a generic error.

use crate::core::PublishState;

const DATABASE_CORRUPTED: &str = "Publish site database corrupted";
const COMPLETED_WITH_WARNINGS: &str = "Completed with Warnings";
const COMPLETED_SUCCESSFULLY: &str = "Completed successfully";
const OOPS: &str = "oops";

/// What one status reading asks the publish loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep waiting
    Stay,
    /// Acknowledge and close the unexpected popup, then keep waiting
    DismissPopup,
    /// Stop in a terminal state
    Finish(PublishState),
}

/// Classify a status text given the number of unexpected windows
pub fn classify(status: &str, unexpected_windows: usize) -> Transition {
    if status.contains(DATABASE_CORRUPTED) {
        Transition::Finish(PublishState::DatabaseCorrupted)
    } else if status.contains(COMPLETED_WITH_WARNINGS) {
        Transition::Finish(PublishState::Warning)
    } else if status.contains(COMPLETED_SUCCESSFULLY) {
        Transition::Finish(PublishState::Success)
    } else if status.to_lowercase().contains(OOPS) {
        Transition::Finish(PublishState::UnhandledError)
    } else if unexpected_windows > 0 {
        Transition::DismissPopup
    } else {
        Transition::Stay
    }
}

/// Tick budget and change detection for the status loop
#[derive(Debug, Clone)]
pub struct StatusTracker {
    /// Ticks started so far
    pub tick: u64,
    /// Maximum number of ticks
    pub max_ticks: u64,
    last_status: Option<String>,
}

impl StatusTracker {
    pub fn new(max_ticks: u64) -> Self {
        Self {
            tick: 0,
            max_ticks,
            last_status: None,
        }
    }

    /// Start the next tick; `false` once the budget is spent
    pub fn next_tick(&mut self) -> bool {
        if self.tick >= self.max_ticks {
            return false;
        }
        self.tick += 1;
        true
    }

    /// Record a reading; `true` if it differs from the previous one
    pub fn observe(&mut self, status: &str) -> bool {
        if self.last_status.as_deref() == Some(status) {
            return false;
        }
        self.last_status = Some(status.to_string());
        true
    }

    /// Forget the last reading so the next one is reported again
    pub fn interrupt(&mut self) {
        self.last_status = None;
    }

    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }
}
