//! Custom error types for publish-pilot
//!
//! One error enum for every layer, from WebDriver commands up to the
//! driver loop. The driver decides what to do with a failed cycle by
//! asking [`PilotError::is_fatal`].

use thiserror::Error;

/// Main error type for publish-pilot operations
#[derive(Error, Debug)]
pub enum PilotError {
    /// Browser hiccup worth retrying (renderer busy, stale element)
    #[error("Transient browser error: {0}")]
    Transient(String),

    /// WebDriver command failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// Could not create a browser session
    #[error("Browser session error: {0}")]
    Session(String),

    /// An element that must exist was not found
    #[error("Can't find element specified by {0}")]
    ElementNotFound(String),

    /// A window the workflow opened never showed up
    #[error("New window did not appear \"{0}\"")]
    WindowDidNotAppear(String),

    /// A window name was registered while still bound
    #[error("Window name used twice \"{0}\"")]
    DuplicateWindow(String),

    /// A window name was used without being registered
    #[error("Unknown window \"{0}\"")]
    UnknownWindow(String),

    /// A window handle is already bound to another name
    #[error("Window handle {handle} already registered as \"{name}\"")]
    HandleConflict { handle: String, name: String },

    /// The restore success marker never appeared
    #[error("Restore failed: {0}")]
    RestoreFailed(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Convenience Result type for publish-pilot operations
pub type Result<T> = std::result::Result<T, PilotError>;

impl PilotError {
    /// Create a transient browser error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a session error
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Errors the poll primitive retries through silently
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Programming-contract violations. Never retried, never swallowed by
    /// the driver loop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DuplicateWindow(_) | Self::UnknownWindow(_) | Self::HandleConflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(PilotError::transient("renderer busy").is_transient());
        assert!(!PilotError::browser("no such frame").is_transient());
        assert!(!PilotError::transient("renderer busy").is_fatal());
    }

    #[test]
    fn test_contract_violations_are_fatal() {
        assert!(PilotError::DuplicateWindow("publish".into()).is_fatal());
        assert!(PilotError::UnknownWindow("nope".into()).is_fatal());
        assert!(PilotError::HandleConflict {
            handle: "w1".into(),
            name: "main".into()
        }
        .is_fatal());
        assert!(!PilotError::RestoreFailed("timeout".into()).is_fatal());
        assert!(!PilotError::WindowDidNotAppear("password".into()).is_fatal());
    }

    #[test]
    fn test_display_messages() {
        let err = PilotError::DuplicateWindow("password".into());
        assert_eq!(err.to_string(), "Window name used twice \"password\"");

        let err = PilotError::ElementNotFound("#OK".into());
        assert_eq!(err.to_string(), "Can't find element specified by #OK");
    }
}
