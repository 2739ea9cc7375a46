use strand_types::ObjectHash;

/// Errors produced by the object manager.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// The local store failed.
    #[error("store error: {0}")]
    Store(#[from] strand_store::StoreError),

    /// A remote fetch failed.
    #[error("network error: {0}")]
    Net(#[from] strand_net::NetError),

    /// A peer answered with content that does not hash to what was asked for.
    #[error("hash mismatch: requested {requested}, received {received}")]
    HashMismatch {
        requested: ObjectHash,
        received: ObjectHash,
    },

    /// A stream was requested without any peer to ask.
    #[error("no peers to request stream {0} from")]
    NoPeers(ObjectHash),
}

/// Convenience alias used throughout the manager crate.
pub type ManagerResult<T> = std::result::Result<T, ManagerError>;
