use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use strand_store::{read_all, FilterSet, Lookup, ObjectStore};
use strand_types::{Object, ObjectHash, PublicKey};
use tracing::debug;

use crate::error::{NetError, NetResult};
use crate::peer::ConnectionInfo;

/// Transport used to fetch objects from remote peers.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch a single object by hash.
    async fn fetch_object(&self, peer: &ConnectionInfo, hash: &ObjectHash) -> NetResult<Object>;

    /// Fetch every object of the stream rooted at `root`, root included.
    async fn fetch_stream(&self, peer: &ConnectionInfo, root: &ObjectHash)
        -> NetResult<Vec<Object>>;
}

/// Network whose remote peers are object stores living in the same process.
#[derive(Default)]
pub struct InMemoryNetwork {
    peers: RwLock<HashMap<PublicKey, Arc<dyn ObjectStore>>>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a peer reachable, serving objects from `store`.
    pub fn attach(&self, peer: PublicKey, store: Arc<dyn ObjectStore>) {
        self.peers
            .write()
            .expect("network lock poisoned")
            .insert(peer, store);
    }

    /// Make a peer unreachable.
    pub fn detach(&self, peer: &PublicKey) -> bool {
        self.peers
            .write()
            .expect("network lock poisoned")
            .remove(peer)
            .is_some()
    }

    fn store_of(&self, peer: &ConnectionInfo) -> NetResult<Arc<dyn ObjectStore>> {
        self.peers
            .read()
            .expect("network lock poisoned")
            .get(&peer.public_key)
            .cloned()
            .ok_or_else(|| NetError::PeerUnreachable(peer.public_key.clone()))
    }
}

#[async_trait]
impl Network for InMemoryNetwork {
    async fn fetch_object(&self, peer: &ConnectionInfo, hash: &ObjectHash) -> NetResult<Object> {
        let store = self.store_of(peer)?;
        let object = store.get(hash)?.ok_or_else(|| NetError::ObjectNotFound {
            peer: peer.public_key.clone(),
            hash: hash.clone(),
        })?;
        debug!(peer = %peer.public_key, hash = hash.short(), "object fetched");
        Ok(object)
    }

    async fn fetch_stream(
        &self,
        peer: &ConnectionInfo,
        root: &ObjectHash,
    ) -> NetResult<Vec<Object>> {
        let store = self.store_of(peer)?;
        let mut reader = store.filter(&FilterSet::new().with(Lookup::ByStream(root.clone())))?;
        let objects = read_all(reader.as_mut()).await?;
        debug!(peer = %peer.public_key, root = root.short(), count = objects.len(), "stream fetched");
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strand_store::InMemoryObjectStore;

    fn remote() -> (ConnectionInfo, Arc<InMemoryObjectStore>, InMemoryNetwork) {
        let info = ConnectionInfo::new(PublicKey::from("remote"));
        let store = Arc::new(InMemoryObjectStore::new());
        let network = InMemoryNetwork::new();
        network.attach(info.public_key.clone(), store.clone());
        (info, store, network)
    }

    #[tokio::test]
    async fn fetch_object_from_attached_peer() {
        let (info, store, network) = remote();
        let stored = store.put(Object::new("note")).unwrap();
        let fetched = network.fetch_object(&info, &stored.hash()).await.unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn fetch_missing_object() {
        let (info, _store, network) = remote();
        let err = network
            .fetch_object(&info, &ObjectHash::from("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::ObjectNotFound { .. }));
    }

    #[tokio::test]
    async fn detached_peer_is_unreachable() {
        let (info, _store, network) = remote();
        assert!(network.detach(&info.public_key));
        let err = network
            .fetch_object(&info, &ObjectHash::from("any"))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::PeerUnreachable(_)));
    }

    #[tokio::test]
    async fn fetch_stream_includes_root_and_members() {
        let (info, store, network) = remote();
        let root = store.put(Object::new("stream:chat")).unwrap().hash();
        for i in 0..3 {
            let message = Object::new("chat.message")
                .with_stream(root.clone())
                .with_field("i", json!(i))
                .unwrap();
            store.put(message).unwrap();
        }
        store.put(Object::new("unrelated")).unwrap();

        let objects = network.fetch_stream(&info, &root).await.unwrap();
        assert_eq!(objects.len(), 4);
        assert_eq!(objects[0].hash(), root);
    }
}
