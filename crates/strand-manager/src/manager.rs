use std::sync::Arc;

use async_trait::async_trait;
use strand_net::{ConnectionInfo, LocalPeer, Network};
use strand_store::{read_all, BoxedReader, FilterSet, ObjectStore, VecReader};
use strand_types::{Object, ObjectHash};
use tracing::{debug, info, warn};

use crate::error::{ManagerError, ManagerResult};
use crate::reader::LiveReader;
use crate::router::SubscriberRouter;

/// Persistence, live subscriptions, and remote retrieval of objects.
#[async_trait]
pub trait ObjectManager: Send + Sync {
    /// Persist an object and notify matching subscribers.
    async fn put(&self, object: Object) -> ManagerResult<Object>;

    /// Open a live reader: stored matches first, then new ones as they arrive.
    async fn subscribe(&self, filter: FilterSet) -> ManagerResult<BoxedReader>;

    /// Fetch one object from a peer and persist it locally.
    async fn request(&self, hash: &ObjectHash, peer: &ConnectionInfo) -> ManagerResult<Object>;

    /// Fetch a whole stream from the first peer that serves it, persist every
    /// object, and return a finite reader over them.
    async fn request_stream(
        &self,
        root: &ObjectHash,
        peers: &[ConnectionInfo],
    ) -> ManagerResult<BoxedReader>;
}

/// Object manager backed by a local store and a network.
pub struct LocalObjectManager {
    store: Arc<dyn ObjectStore>,
    network: Arc<dyn Network>,
    local: Arc<LocalPeer>,
    router: SubscriberRouter,
}

impl LocalObjectManager {
    pub fn new(store: Arc<dyn ObjectStore>, network: Arc<dyn Network>, local: Arc<LocalPeer>) -> Self {
        Self {
            store,
            network,
            local,
            router: SubscriberRouter::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Number of live subscriptions the router still tracks.
    pub fn subscriber_count(&self) -> usize {
        self.router.subscriber_count()
    }
}

#[async_trait]
impl ObjectManager for LocalObjectManager {
    async fn put(&self, object: Object) -> ManagerResult<Object> {
        let hash = object.hash();
        let inserted = self.store.insert(&object)?;

        if self.local.has_content_type(object.object_type()) {
            self.local.put_content_hashes([hash.clone()]);
        }
        // Only the write that stored the content routes it.
        if inserted {
            self.router.route(&hash, &object);
        }
        debug!(hash = hash.short(), object_type = object.object_type(), inserted, "object put");
        Ok(object)
    }

    async fn subscribe(&self, filter: FilterSet) -> ManagerResult<BoxedReader> {
        // Register before the snapshot so nothing written in between is missed.
        let live = self.router.subscribe(filter.clone());
        let mut snapshot = self.store.filter(&filter)?;
        let replay = read_all(snapshot.as_mut()).await?;
        debug!(replay = replay.len(), "subscription opened");
        Ok(Box::new(LiveReader::new(replay, live)))
    }

    async fn request(&self, hash: &ObjectHash, peer: &ConnectionInfo) -> ManagerResult<Object> {
        let object = self.network.fetch_object(peer, hash).await?;
        let received = object.hash();
        if &received != hash {
            return Err(ManagerError::HashMismatch {
                requested: hash.clone(),
                received,
            });
        }
        self.put(object).await
    }

    async fn request_stream(
        &self,
        root: &ObjectHash,
        peers: &[ConnectionInfo],
    ) -> ManagerResult<BoxedReader> {
        let mut last_err = None;
        for peer in peers {
            match self.network.fetch_stream(peer, root).await {
                Ok(objects) => {
                    let mut stored = Vec::with_capacity(objects.len());
                    for object in objects {
                        stored.push(self.put(object).await?);
                    }
                    info!(root = root.short(), peer = %peer.public_key, count = stored.len(), "stream retrieved");
                    return Ok(Box::new(VecReader::new(stored)));
                }
                Err(e) => {
                    warn!(root = root.short(), peer = %peer.public_key, error = %e, "stream fetch failed");
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e.into()),
            None => Err(ManagerError::NoPeers(root.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strand_crypto::SigningKey;
    use strand_net::InMemoryNetwork;
    use strand_store::{InMemoryObjectStore, Lookup};
    use strand_types::PublicKey;

    struct Fixture {
        manager: LocalObjectManager,
        store: Arc<InMemoryObjectStore>,
        network: Arc<InMemoryNetwork>,
        local: Arc<LocalPeer>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryObjectStore::new());
        let network = Arc::new(InMemoryNetwork::new());
        let local = Arc::new(LocalPeer::new(SigningKey::from_bytes([1u8; 32])));
        let manager = LocalObjectManager::new(store.clone(), network.clone(), local.clone());
        Fixture {
            manager,
            store,
            network,
            local,
        }
    }

    fn remote(network: &InMemoryNetwork, name: &str) -> (ConnectionInfo, Arc<InMemoryObjectStore>) {
        let info = ConnectionInfo::new(PublicKey::from(name));
        let store = Arc::new(InMemoryObjectStore::new());
        network.attach(info.public_key.clone(), store.clone());
        (info, store)
    }

    fn note(body: &str) -> Object {
        Object::new("note").with_field("body", json!(body)).unwrap()
    }

    #[tokio::test]
    async fn put_persists() {
        let f = fixture();
        let stored = f.manager.put(note("hi")).await.unwrap();
        assert!(f.store.contains(&stored.hash()).unwrap());
    }

    #[tokio::test]
    async fn put_registers_content_hashes_for_registered_types() {
        let f = fixture();
        f.local.put_content_types(vec!["stream:chat".to_string()]);
        let root = f.manager.put(Object::new("stream:chat")).await.unwrap();
        f.manager.put(note("not advertised")).await.unwrap();
        assert_eq!(f.local.content_hashes(), vec![root.hash()]);
    }

    #[tokio::test]
    async fn subscribe_replays_then_follows() {
        let f = fixture();
        f.manager.put(note("before")).await.unwrap();

        let filter = FilterSet::new().with(Lookup::ByType("note".into()));
        let mut reader = f.manager.subscribe(filter).await.unwrap();
        f.manager.put(Object::new("other")).await.unwrap();
        f.manager.put(note("after")).await.unwrap();

        let first = reader.read().await.unwrap().unwrap();
        let second = reader.read().await.unwrap().unwrap();
        assert_eq!(first.field("body"), Some(&json!("before")));
        assert_eq!(second.field("body"), Some(&json!("after")));
    }

    #[tokio::test]
    async fn reput_does_not_notify_twice() {
        let f = fixture();
        let mut reader = f.manager.subscribe(FilterSet::new()).await.unwrap();
        f.manager.put(note("once")).await.unwrap();
        f.manager.put(note("once")).await.unwrap();
        f.manager.put(note("marker")).await.unwrap();

        let first = reader.read().await.unwrap().unwrap();
        let second = reader.read().await.unwrap().unwrap();
        assert_eq!(first.field("body"), Some(&json!("once")));
        assert_eq!(second.field("body"), Some(&json!("marker")));
    }

    #[tokio::test]
    async fn slow_subscriber_receives_full_backlog() {
        let f = fixture();
        let filter = FilterSet::new().with(Lookup::ByType("note".into()));
        let mut reader = f.manager.subscribe(filter).await.unwrap();
        for n in 0..3000 {
            f.manager.put(note(&n.to_string())).await.unwrap();
        }
        for n in 0..3000 {
            let object = reader.read().await.unwrap().unwrap();
            assert_eq!(object.field("body"), Some(&json!(n.to_string())));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_puts_notify_once() {
        let f = Arc::new(fixture());
        let mut reader = f.manager.subscribe(FilterSet::new()).await.unwrap();
        for round in 0..50 {
            let tasks: Vec<_> = (0..8)
                .map(|_| {
                    let f = f.clone();
                    let body = format!("contended-{round}");
                    tokio::spawn(async move { f.manager.put(note(&body)).await.unwrap() })
                })
                .collect();
            for task in tasks {
                task.await.unwrap();
            }
        }
        f.manager.put(note("marker")).await.unwrap();

        for round in 0..50 {
            let object = reader.read().await.unwrap().unwrap();
            assert_eq!(object.field("body"), Some(&json!(format!("contended-{round}"))));
        }
        let last = reader.read().await.unwrap().unwrap();
        assert_eq!(last.field("body"), Some(&json!("marker")));
    }

    #[tokio::test]
    async fn closed_readers_are_pruned() {
        let f = fixture();
        let mut reader = f.manager.subscribe(FilterSet::new()).await.unwrap();
        assert_eq!(f.manager.subscriber_count(), 1);
        reader.close();
        f.manager.put(note("x")).await.unwrap();
        assert_eq!(f.manager.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn request_fetches_and_persists() {
        let f = fixture();
        let (peer, remote_store) = remote(&f.network, "remote");
        let object = remote_store.put(note("far away")).unwrap();

        let fetched = f.manager.request(&object.hash(), &peer).await.unwrap();
        assert_eq!(fetched, object);
        assert!(f.store.contains(&object.hash()).unwrap());
    }

    #[tokio::test]
    async fn request_unknown_peer_fails() {
        let f = fixture();
        let peer = ConnectionInfo::new(PublicKey::from("ghost"));
        let err = f
            .manager
            .request(&ObjectHash::from("deadbeef"), &peer)
            .await
            .unwrap_err();
        assert!(matches!(err, ManagerError::Net(_)));
    }

    #[tokio::test]
    async fn request_stream_uses_first_serving_peer() {
        let f = fixture();
        let ghost = ConnectionInfo::new(PublicKey::from("ghost"));
        let (peer, remote_store) = remote(&f.network, "remote");
        let root = remote_store.put(Object::new("stream:chat")).unwrap().hash();
        remote_store
            .put(note("in stream").with_stream(root.clone()))
            .unwrap();

        let mut reader = f
            .manager
            .request_stream(&root, &[ghost, peer])
            .await
            .unwrap();
        let objects = read_all(reader.as_mut()).await.unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(f.store.len(), 2);
    }

    #[tokio::test]
    async fn request_stream_without_peers() {
        let f = fixture();
        let Err(err) = f
            .manager
            .request_stream(&ObjectHash::from("deadbeef"), &[])
            .await
        else {
            panic!("expected no peers");
        };
        assert!(matches!(err, ManagerError::NoPeers(_)));
    }
}
