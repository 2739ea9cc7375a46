use std::collections::BTreeSet;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use strand_crypto::SigningKey;
use strand_types::{Object, ObjectHash, PublicKey, TypeError, Value};

/// Object type of an encoded [`ConnectionInfo`].
pub const CONNECTION_INFO_TYPE: &str = "peer.ConnectionInfo";

/// How to reach a peer: its public key, addresses, and relays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub public_key: PublicKey,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub relays: Vec<ConnectionInfo>,
}

impl ConnectionInfo {
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            addresses: Vec::new(),
            relays: Vec::new(),
        }
    }

    pub fn with_addresses(mut self, addresses: Vec<String>) -> Self {
        self.addresses = addresses;
        self
    }

    /// Render as an object owned by the peer it describes.
    pub fn to_object(&self) -> Result<Object, TypeError> {
        let relays = serde_json::to_value(&self.relays)
            .map_err(|e| TypeError::Serialization(e.to_string()))?;
        Object::new(CONNECTION_INFO_TYPE)
            .with_owner(self.public_key.clone())
            .with_field("addresses", Value::from(self.addresses.clone()))?
            .with_field("relays", relays)
    }
}

#[derive(Default)]
struct PeerState {
    identity_key: Option<SigningKey>,
    addresses: Vec<String>,
    relays: Vec<ConnectionInfo>,
    content_hashes: BTreeSet<ObjectHash>,
    content_types: BTreeSet<String>,
}

/// The local peer: its keys and what it advertises to the network.
///
/// The peer key is fixed at construction. Everything else may be updated
/// while the broker runs and is guarded by a `RwLock`.
pub struct LocalPeer {
    peer_key: SigningKey,
    peer_public_key: PublicKey,
    state: RwLock<PeerState>,
}

impl LocalPeer {
    pub fn new(peer_key: SigningKey) -> Self {
        let peer_public_key = peer_key.public_key();
        Self {
            peer_key,
            peer_public_key,
            state: RwLock::new(PeerState::default()),
        }
    }

    /// Public key of the primary peer key.
    pub fn peer_public_key(&self) -> &PublicKey {
        &self.peer_public_key
    }

    pub fn peer_key(&self) -> &SigningKey {
        &self.peer_key
    }

    /// Public key of the primary identity key, if one is set.
    pub fn identity_public_key(&self) -> Option<PublicKey> {
        self.state
            .read()
            .expect("peer lock poisoned")
            .identity_key
            .as_ref()
            .map(SigningKey::public_key)
    }

    pub fn put_identity_key(&self, key: SigningKey) {
        self.state.write().expect("peer lock poisoned").identity_key = Some(key);
    }

    pub fn put_addresses(&self, addresses: impl IntoIterator<Item = String>) {
        let mut state = self.state.write().expect("peer lock poisoned");
        for address in addresses {
            if !state.addresses.contains(&address) {
                state.addresses.push(address);
            }
        }
    }

    pub fn addresses(&self) -> Vec<String> {
        self.state.read().expect("peer lock poisoned").addresses.clone()
    }

    pub fn put_relays(&self, relays: impl IntoIterator<Item = ConnectionInfo>) {
        let mut state = self.state.write().expect("peer lock poisoned");
        for relay in relays {
            if !state.relays.contains(&relay) {
                state.relays.push(relay);
            }
        }
    }

    /// Register object types whose hashes this peer advertises as held.
    pub fn put_content_types(&self, types: impl IntoIterator<Item = String>) {
        self.state
            .write()
            .expect("peer lock poisoned")
            .content_types
            .extend(types);
    }

    pub fn has_content_type(&self, object_type: &str) -> bool {
        self.state
            .read()
            .expect("peer lock poisoned")
            .content_types
            .contains(object_type)
    }

    pub fn put_content_hashes(&self, hashes: impl IntoIterator<Item = ObjectHash>) {
        self.state
            .write()
            .expect("peer lock poisoned")
            .content_hashes
            .extend(hashes);
    }

    pub fn content_hashes(&self) -> Vec<ObjectHash> {
        self.state
            .read()
            .expect("peer lock poisoned")
            .content_hashes
            .iter()
            .cloned()
            .collect()
    }

    /// Snapshot of how other peers can reach this one.
    pub fn connection_info(&self) -> ConnectionInfo {
        let state = self.state.read().expect("peer lock poisoned");
        ConnectionInfo {
            public_key: self.peer_public_key.clone(),
            addresses: state.addresses.clone(),
            relays: state.relays.clone(),
        }
    }
}

impl std::fmt::Debug for LocalPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPeer")
            .field("public_key", &self.peer_public_key)
            .finish_non_exhaustive()
    }
}
