use custodia_types::EvidenceId;

/// Errors from catalog and payload store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Evidence with this ID is already cataloged. Evidence metadata is
    /// immutable, so a second insert is always a caller bug.
    #[error("evidence already cataloged: {0}")]
    DuplicateEvidence(EvidenceId),

    /// A recorded payload location no longer resolves to stored bytes.
    #[error("payload not found at {0}")]
    PayloadNotFound(String),

    /// A catalog row exists but cannot be encoded or decoded.
    #[error("corrupt catalog row at {path}: {reason}")]
    CorruptRow { path: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
