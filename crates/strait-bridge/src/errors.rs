//! Bridge error taxonomy.
//!
//! Every failure in the marshaling and invocation layer is one of five
//! kinds, raised at the point of detection and propagated synchronously
//! to the immediate caller. There are no internal retries.

/// Result alias used throughout the bridge.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A payload could not be decoded: unknown target type, malformed
    /// text, or a structural mismatch between payload and type.
    #[error("cannot decode `{payload}` as {class_name}: {detail}")]
    Decode {
        class_name: String,
        payload: String,
        detail: String,
    },

    /// An argument was accessed through the wrong origin accessor, or an
    /// argument list violated a construction constraint.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Method resolution exhausted the class hierarchy without a match.
    #[error("{0}")]
    MethodNotFound(String),

    /// Constructor resolution failed, or instantiation itself failed.
    #[error("{0}")]
    Instantiation(String),

    /// The invocation target was not ready, lacked a required capability,
    /// or the operation itself failed.
    #[error("{0}")]
    Invocation(String),
}

impl Error {
    /// Build a [`Error::Decode`] with the offending payload attached.
    pub fn decode(
        class_name: impl Into<String>,
        payload: impl Into<String>,
        detail: impl Into<String>,
    ) -> Error {
        Error::Decode {
            class_name: class_name.into(),
            payload: payload.into(),
            detail: detail.into(),
        }
    }
}
