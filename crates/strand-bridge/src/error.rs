use thiserror::Error;

/// Errors surfaced at the bridge boundary.
///
/// Collaborator errors keep their own messages; everything the caller sees
/// is the `Display` of one of these variants.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid lookup query: {0}")]
    InvalidLookup(String),

    #[error("missing subscription key")]
    MissingSubscription,

    #[error("subscription closed")]
    SubscriptionClosed,

    #[error("end of stream")]
    EndOfStream,

    #[error("bridge not initialized")]
    NotInitialized,

    #[error("{0} not implemented")]
    NotImplemented(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Type(#[from] strand_types::TypeError),

    #[error(transparent)]
    Key(#[from] strand_crypto::KeyError),

    #[error(transparent)]
    Store(#[from] strand_store::StoreError),

    #[error(transparent)]
    Net(#[from] strand_net::NetError),

    #[error(transparent)]
    Manager(#[from] strand_manager::ManagerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
