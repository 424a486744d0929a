//! Error types for the event bus.

use thiserror::Error;

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Errors that can resolve a publish receipt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// No handler is registered for the published event type.
    #[error("no handler registered for event type {event_type}")]
    NoHandler {
        /// Name of the event type.
        event_type: &'static str,
    },

    /// The bus has been shut down and accepts no further events.
    #[error("event bus is closed")]
    Closed,

    /// The completion signal was dropped before resolution.
    #[error("completion signal dropped before resolution")]
    Dropped,

    /// A registered handler received an event of an unexpected type.
    #[error("handler invoked with mismatched event type")]
    TypeMismatch,

    /// A handler failed while processing the event.
    #[error("handler failed: {message}")]
    Handler {
        /// Description of the failure.
        message: String,
    },
}

impl BusError {
    /// Creates a handler failure error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }
}
