/// Errors from object store and reader operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Attempted to write an object with an empty type.
    #[error("cannot store object without a type")]
    MissingType,

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
