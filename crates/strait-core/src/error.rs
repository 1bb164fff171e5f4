//! Error types shared by the runtime object model.

use std::fmt::Write as _;

/// Errors raised while registering classes with a [`crate::ClassRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A class with the same name is already registered
    #[error("class {0} is already registered")]
    DuplicateClass(String),

    /// A class name is reserved by the runtime (primitives, array spellings)
    #[error("class name {0} is reserved")]
    ReservedName(String),
}

/// Failure of a managed method, constructor, or task.
///
/// Managed bodies are plain closures, so this is the one error currency
/// they share with the bridge. A `CallError` optionally carries a cause
/// chain; [`CallError::trace`] renders the whole chain as text for
/// transmission through the failure entry point.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CallError {
    message: String,
    cause: Option<Box<CallError>>,
}

impl CallError {
    /// Create an error with a message and no cause.
    pub fn new(message: impl Into<String>) -> Self {
        CallError {
            message: message.into(),
            cause: None,
        }
    }

    /// Create an error caused by another `CallError`.
    pub fn with_cause(message: impl Into<String>, cause: CallError) -> Self {
        CallError {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// A cancellation outcome, used when an asynchronous task was
    /// cancelled before completing.
    pub fn cancelled() -> Self {
        CallError::new("task was cancelled before completion")
    }

    /// The error message without the cause chain.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Render the full diagnostic trace, one line per cause.
    pub fn trace(&self) -> String {
        let mut out = self.message.clone();
        let mut next = self.cause.as_deref();
        while let Some(cause) = next {
            // write! to a String cannot fail
            let _ = write!(out, "\ncaused by: {}", cause.message);
            next = cause.cause.as_deref();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_renders_cause_chain() {
        let root = CallError::new("disk unavailable");
        let mid = CallError::with_cause("could not load state", root);
        let top = CallError::with_cause("fetch failed", mid);

        let trace = top.trace();
        assert_eq!(
            trace,
            "fetch failed\ncaused by: could not load state\ncaused by: disk unavailable"
        );
    }

    #[test]
    fn test_trace_without_cause_is_message() {
        let err = CallError::new("boom");
        assert_eq!(err.trace(), "boom");
        assert_eq!(err.message(), "boom");
    }
}
