use strand_types::{ObjectHash, PublicKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("peer unreachable: {0}")]
    PeerUnreachable(PublicKey),

    #[error("object {hash} not found on peer {peer}")]
    ObjectNotFound { peer: PublicKey, hash: ObjectHash },

    #[error("resolver error: {0}")]
    Resolver(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("store error: {0}")]
    Store(#[from] strand_store::StoreError),

    #[error("type error: {0}")]
    Type(#[from] strand_types::TypeError),
}

pub type NetResult<T> = Result<T, NetError>;
