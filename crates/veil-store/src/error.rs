use veil_types::{RootId, TypeError};

/// Boxed error from an asynchronous dependency.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from backing store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// No checkout state is registered under this root.
    #[error("unknown root: {0}")]
    UnknownRoot(RootId),

    /// The object exists but is not of the requested kind.
    #[error("object {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The caller supplied input the store cannot accept.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// A root or object identifier could not be decoded.
    #[error("malformed {kind} identifier {bytes}: {reason}")]
    MalformedIdentifier {
        kind: &'static str,
        /// Hex rendering of the offending bytes.
        bytes: String,
        reason: String,
    },

    /// Two identifiers of different object kinds were compared.
    #[error("cannot compare objects of different kinds: {one} vs {two}")]
    InvalidComparison { one: String, two: String },

    /// An asynchronous dependency failed outright.
    #[error("{operation} failed for {subject}: {source}")]
    ResolutionFailure {
        operation: &'static str,
        subject: String,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    /// Build a [`StoreError::MalformedIdentifier`] naming the offending bytes.
    pub fn malformed(kind: &'static str, bytes: &[u8], reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            kind,
            bytes: hex::encode(bytes),
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
