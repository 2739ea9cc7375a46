use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Wire literal asking for the local peer's key as owner.
pub const PEER_DIRECTIVE: &str = "@peer";
/// Wire literal asking for the local identity's key as owner.
pub const IDENTITY_DIRECTIVE: &str = "@identity";

/// Public key of an object owner or a peer, in its textual form.
///
/// Owners are opaque to the broker: any literal a caller supplies is stored
/// unchanged. Keys derived locally use the `ed25519.<hex>` form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.0)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PublicKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PublicKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Owner of an object as supplied by a caller, before the object is written.
///
/// The `@peer` and `@identity` literals are directives resolved against the
/// local keys at write time; every other value is an owner key taken as is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnerSpec {
    /// Substitute the local peer's public key.
    Peer,
    /// Substitute the local identity's public key.
    Identity,
    /// A literal owner key.
    Key(PublicKey),
}

impl OwnerSpec {
    /// Parse the wire form of an owner.
    pub fn parse(s: &str) -> Self {
        match s {
            PEER_DIRECTIVE => Self::Peer,
            IDENTITY_DIRECTIVE => Self::Identity,
            other => Self::Key(PublicKey::new(other)),
        }
    }

    /// Resolve directives against the local keys.
    ///
    /// Fails only for `@identity` when no identity key is configured.
    pub fn resolve(
        self,
        peer: &PublicKey,
        identity: Option<&PublicKey>,
    ) -> Result<PublicKey, TypeError> {
        match self {
            Self::Peer => Ok(peer.clone()),
            Self::Identity => identity.cloned().ok_or(TypeError::MissingIdentityKey),
            Self::Key(key) => Ok(key),
        }
    }
}

impl fmt::Display for OwnerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peer => f.write_str(PEER_DIRECTIVE),
            Self::Identity => f.write_str(IDENTITY_DIRECTIVE),
            Self::Key(key) => write!(f, "{key}"),
        }
    }
}
