use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use strand_types::{ObjectHash, PublicKey};
use tracing::debug;

use crate::error::NetResult;
use crate::peer::ConnectionInfo;

/// What to look peers up by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupCriteria {
    /// Peers that hold the object with this hash.
    ContentHash(ObjectHash),
    /// The peer with this public key.
    PublicKey(PublicKey),
}

/// Peer discovery.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn lookup(&self, criteria: &LookupCriteria) -> NetResult<Vec<ConnectionInfo>>;

    /// Publish that `peer` holds the given content.
    async fn advertise(&self, peer: &ConnectionInfo, hashes: &[ObjectHash]) -> NetResult<()>;
}

struct Announcement {
    info: ConnectionInfo,
    hashes: BTreeSet<ObjectHash>,
}

/// Resolver answering from a table of peer announcements.
#[derive(Default)]
pub struct InMemoryResolver {
    peers: RwLock<BTreeMap<PublicKey, Announcement>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `peer` holds the given content. Repeated announcements
    /// replace the connection info and add to the held hashes.
    pub fn announce(&self, peer: ConnectionInfo, hashes: impl IntoIterator<Item = ObjectHash>) {
        let mut peers = self.peers.write().expect("resolver lock poisoned");
        let entry = peers
            .entry(peer.public_key.clone())
            .or_insert_with(|| Announcement {
                info: peer.clone(),
                hashes: BTreeSet::new(),
            });
        entry.info = peer;
        entry.hashes.extend(hashes);
    }

    /// Forget a peer entirely.
    pub fn withdraw(&self, peer: &PublicKey) -> bool {
        self.peers
            .write()
            .expect("resolver lock poisoned")
            .remove(peer)
            .is_some()
    }
}

#[async_trait]
impl Resolver for InMemoryResolver {
    async fn lookup(&self, criteria: &LookupCriteria) -> NetResult<Vec<ConnectionInfo>> {
        let peers = self.peers.read().expect("resolver lock poisoned");
        let found: Vec<ConnectionInfo> = match criteria {
            LookupCriteria::ContentHash(hash) => peers
                .values()
                .filter(|a| a.hashes.contains(hash))
                .map(|a| a.info.clone())
                .collect(),
            LookupCriteria::PublicKey(key) => peers.get(key).map(|a| a.info.clone()).into_iter().collect(),
        };
        debug!(?criteria, count = found.len(), "resolver lookup");
        Ok(found)
    }

    async fn advertise(&self, peer: &ConnectionInfo, hashes: &[ObjectHash]) -> NetResult<()> {
        debug!(peer = %peer.public_key, count = hashes.len(), "content advertised");
        self.announce(peer.clone(), hashes.iter().cloned());
        Ok(())
    }
}
