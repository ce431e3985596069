//! Error types for the station
//!
//! None of these ever reach the caller of a public station method. They are
//! produced on internal fallible paths, logged, and dropped.

use thiserror::Error;

/// Error raised by a listener body
///
/// Listeners may fail with anything; the station only logs it.
pub type ListenerError = anyhow::Error;

/// Result returned by a listener body
pub type ListenerResult = Result<(), ListenerError>;

/// Internal station failures
#[derive(Debug, Error)]
pub enum StationError {
    /// Named-event operation called with an empty event name
    #[error("event name must not be empty")]
    EmptyEventName,

    /// Deferred listener work had no tokio runtime to run on
    #[error("no tokio runtime available, dropped {dropped} deferred listener(s)")]
    NoRuntime { dropped: usize },

    /// A listener returned an error
    #[error("listener failed: {0}")]
    Listener(#[source] ListenerError),

    /// A listener panicked
    #[error("listener panicked: {0}")]
    ListenerPanicked(String),
}

impl StationError {
    /// Build a `ListenerPanicked` from a `catch_unwind` / `JoinError` payload
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "<non-string panic payload>".to_string()
        };
        StationError::ListenerPanicked(message)
    }
}
