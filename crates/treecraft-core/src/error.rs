//! Error types for tree persistence and exchange.

/// Failures of the key-value persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),

    /// Stored payload exists but does not parse as a tree collection.
    #[error("corrupt payload under `{key}`: {message}")]
    Corrupt { key: String, message: String },

    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Failures of export and import. Import is all-or-nothing: on any of
/// these, nothing has been persisted.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The payload is not a well-formed tree object.
    #[error("malformed import payload: {0}")]
    Malformed(String),

    /// A tree could not be turned into an export snapshot.
    #[error("export serialization error: {0}")]
    Serialize(String),

    /// Integrity validation rejected the imported tree.
    #[error("import rejected by integrity check: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },
}
