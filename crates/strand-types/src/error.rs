use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("field name is reserved: {0}")]
    ReservedField(String),

    #[error("local identity key is not set")]
    MissingIdentityKey,

    #[error("serialization error: {0}")]
    Serialization(String),
}
