use std::future::Future;
use std::sync::Arc;

use strand_manager::ObjectManager;
use strand_net::{ConnectionInfo, LocalPeer, Resolver};
use strand_store::{read_all, FilterSet, Lookup, ObjectStore};
use strand_types::{Object, ObjectDraft, ObjectHash, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::envelope::{self, GetRequest, GetResponse};
use crate::error::{BridgeError, BridgeResult};
use crate::lookup::{self, CompileMode};
use crate::operation::Operation;
use crate::provision::Collaborators;
use crate::registry::SubscriptionRegistry;
use crate::sync::SyncOrchestrator;

/// Object type of the root of a per-type feed stream.
pub const FEED_ROOT_TYPE: &str = "stream:strand.feed";
/// Field of a feed root naming the object type it collects.
pub const FEED_OBJECT_TYPE_FIELD: &str = "objectType";

/// Version reported by the `version` operation.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Owns the collaborators and the open subscriptions; serves every operation.
pub struct Broker {
    store: Arc<dyn ObjectStore>,
    manager: Arc<dyn ObjectManager>,
    resolver: Arc<dyn Resolver>,
    local: Arc<LocalPeer>,
    registry: SubscriptionRegistry,
    sync: SyncOrchestrator,
    config: BridgeConfig,
}

impl Broker {
    /// Build a broker and advertise stored content of the registered types.
    pub async fn open(parts: Collaborators, config: BridgeConfig) -> BridgeResult<Self> {
        let sync = SyncOrchestrator::new(
            parts.resolver.clone(),
            parts.manager.clone(),
            parts.local.peer_public_key().clone(),
            config.request_stream_timeout(),
        );
        let broker = Self {
            store: parts.store,
            manager: parts.manager,
            resolver: parts.resolver,
            local: parts.local,
            registry: SubscriptionRegistry::new(),
            sync,
            config,
        };
        broker.advertise_held_content().await?;
        Ok(broker)
    }

    async fn advertise_held_content(&self) -> BridgeResult<()> {
        if self.config.content_types.is_empty() {
            return Ok(());
        }
        let filter = self
            .config
            .content_types
            .iter()
            .fold(FilterSet::new(), |f, t| f.with(Lookup::ByType(t.clone())));
        let mut reader = self.store.filter(&filter)?;
        let held = read_all(reader.as_mut()).await?;
        info!(count = held.len(), "advertising held content");
        self.local.put_content_hashes(held.iter().map(Object::hash));
        self.resolver
            .advertise(&self.local.connection_info(), &self.local.content_hashes())
            .await?;
        Ok(())
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn local_peer(&self) -> &Arc<LocalPeer> {
        &self.local
    }

    pub fn open_subscriptions(&self) -> usize {
        self.registry.len()
    }

    async fn bounded<T, F>(&self, fut: F) -> BridgeResult<T>
    where
        F: Future<Output = BridgeResult<T>>,
    {
        let limit = self.config.call_timeout();
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| BridgeError::Timeout(limit.as_millis() as u64))?
    }

    /// Strict-compile the lookups and drain every match.
    pub async fn get(&self, request: &GetRequest) -> BridgeResult<Vec<Object>> {
        let filter = lookup::compile_request(request)?;
        self.bounded(async {
            let mut reader = self.store.filter(&filter)?;
            Ok::<_, BridgeError>(read_all(reader.as_mut()).await?)
        })
        .await
    }

    /// Resolve owner directives and hand the object to the manager.
    pub async fn put(&self, draft: ObjectDraft) -> BridgeResult<Object> {
        let identity = self.local.identity_public_key();
        let object = draft.resolve(self.local.peer_public_key(), identity.as_ref())?;
        let stored = self
            .bounded(async { Ok::<_, BridgeError>(self.manager.put(object).await?) })
            .await?;
        let hash = stored.hash();
        if self.local.has_content_type(stored.object_type()) {
            self.resolver
                .advertise(&self.local.connection_info(), std::slice::from_ref(&hash))
                .await?;
        }
        debug!(hash = hash.short(), "put accepted");
        Ok(stored)
    }

    /// Open a live reader for a tolerant-compiled lookup and return its token.
    pub async fn subscribe(&self, query: &str) -> BridgeResult<String> {
        let filter = lookup::compile(&[query], CompileMode::Tolerant)?;
        let reader = self
            .bounded(async { Ok::<_, BridgeError>(self.manager.subscribe(filter).await?) })
            .await?;
        Ok(self.registry.register(reader))
    }

    pub async fn pop(&self, token: &str) -> BridgeResult<Object> {
        let subscription = self.registry.get(token)?;
        subscription.next(self.config.call_timeout()).await
    }

    pub async fn cancel(&self, token: &str) -> BridgeResult<()> {
        let subscription = self.registry.remove(token)?;
        subscription.close().await;
        Ok(())
    }

    pub async fn request_stream(&self, hash: &ObjectHash) -> BridgeResult<Vec<JoinHandle<()>>> {
        self.sync.request_stream(hash).await
    }

    /// Hash of the feed root for `object_type`, owned by the local peer.
    pub fn feed_root_hash(&self, object_type: &str) -> BridgeResult<ObjectHash> {
        let root = Object::new(FEED_ROOT_TYPE)
            .with_owner(self.local.peer_public_key().clone())
            .with_field(FEED_OBJECT_TYPE_FIELD, Value::from(object_type))?;
        Ok(root.hash())
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        self.local.connection_info()
    }

    /// Decode the payload for `op`, run it, and encode the result.
    pub async fn dispatch(&self, op: Operation, payload: Vec<u8>) -> BridgeResult<Vec<u8>> {
        match op {
            Operation::Init => Ok(Vec::new()),
            Operation::Get => {
                let request: GetRequest = serde_json::from_slice(&payload)?;
                let object_bodies = self
                    .get(&request)
                    .await?
                    .iter()
                    .map(|o| serde_json::to_string(&envelope::to_map(o)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(serde_json::to_vec(&GetResponse { object_bodies })?)
            }
            Operation::Put => envelope::encode(&self.put(envelope::decode(&payload)?).await?),
            Operation::Subscribe => Ok(self.subscribe(&text(payload)?).await?.into_bytes()),
            Operation::Pop => envelope::encode(&self.pop(&text(payload)?).await?),
            Operation::Cancel => {
                self.cancel(&text(payload)?).await?;
                Ok(Vec::new())
            }
            Operation::RequestStream => {
                self.request_stream(&ObjectHash::new(text(payload)?)).await?;
                Ok(Vec::new())
            }
            Operation::GetFeedRootHash => {
                Ok(self.feed_root_hash(&text(payload)?)?.as_str().as_bytes().to_vec())
            }
            Operation::GetConnectionInfo => envelope::encode(&self.connection_info().to_object()?),
            Operation::Version => Ok(version().as_bytes().to_vec()),
        }
    }
}

fn text(payload: Vec<u8>) -> BridgeResult<String> {
    String::from_utf8(payload).map_err(|e| BridgeError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::{InMemoryProvisioner, Provisioner};
    use serde_json::json;
    use strand_crypto::SigningKey;
    use strand_net::LookupCriteria;
    use strand_types::PublicKey;

    async fn broker_with(config: BridgeConfig) -> (Broker, InMemoryProvisioner) {
        let provisioner = InMemoryProvisioner::new();
        let parts = provisioner.provision(&config).unwrap();
        (Broker::open(parts, config).await.unwrap(), provisioner)
    }

    async fn broker() -> Broker {
        broker_with(BridgeConfig::default()).await.0
    }

    fn draft(body: &str, owner: &str) -> ObjectDraft {
        envelope::decode(
            json!({"type": "note", "body": body, "owner": owner})
                .to_string()
                .as_bytes(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn put_substitutes_peer_owner() {
        let broker = broker().await;
        let stored = broker.put(draft("hi", "@peer")).await.unwrap();
        assert_eq!(stored.owner(), Some(broker.local_peer().peer_public_key()));
    }

    #[tokio::test]
    async fn put_substitutes_identity_owner() {
        let identity = SigningKey::from_bytes([7u8; 32]);
        let config = BridgeConfig {
            identity_key: Some(identity.to_hex()),
            ..BridgeConfig::default()
        };
        let (broker, _) = broker_with(config).await;
        let stored = broker.put(draft("hi", "@identity")).await.unwrap();
        assert_eq!(stored.owner(), Some(&identity.public_key()));
    }

    #[tokio::test]
    async fn identity_owner_without_identity_key_fails() {
        let broker = broker().await;
        assert!(matches!(
            broker.put(draft("hi", "@identity")).await,
            Err(BridgeError::Type(_))
        ));
    }

    #[tokio::test]
    async fn literal_owner_is_kept() {
        let broker = broker().await;
        let stored = broker.put(draft("hi", "ed25519.someone")).await.unwrap();
        assert_eq!(stored.owner(), Some(&PublicKey::from("ed25519.someone")));
    }

    #[tokio::test]
    async fn get_filters_and_orders() {
        let broker = broker().await;
        for body in ["b", "a", "c"] {
            broker.put(draft(body, "@peer")).await.unwrap();
        }
        broker
            .put(envelope::decode(br#"{"type":"other"}"#).unwrap())
            .await
            .unwrap();

        let request = GetRequest {
            lookups: vec!["type:note".into()],
            order_by: "body".into(),
            ..GetRequest::default()
        };
        let bodies: Vec<Value> = broker
            .get(&request)
            .await
            .unwrap()
            .iter()
            .map(|o| o.field("body").cloned().unwrap())
            .collect();
        assert_eq!(bodies, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[tokio::test]
    async fn get_rejects_bad_lookup() {
        let broker = broker().await;
        let request = GetRequest {
            lookups: vec!["note".into()],
            ..GetRequest::default()
        };
        let err = broker.get(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid lookup query: note");
    }

    #[tokio::test]
    async fn feed_root_hash_is_deterministic() {
        let broker = broker().await;
        let a = broker.feed_root_hash("chat.message").unwrap();
        assert_eq!(a, broker.feed_root_hash("chat.message").unwrap());
        assert_ne!(a, broker.feed_root_hash("note").unwrap());

        let expected = Object::new(FEED_ROOT_TYPE)
            .with_owner(broker.local_peer().peer_public_key().clone())
            .with_field(FEED_OBJECT_TYPE_FIELD, json!("chat.message"))
            .unwrap()
            .hash();
        assert_eq!(a, expected);
    }

    #[tokio::test]
    async fn held_content_is_advertised_on_open() {
        let provisioner = InMemoryProvisioner::new();
        let root = provisioner.store().put(Object::new("stream:chat")).unwrap();
        provisioner.store().put(Object::new("note")).unwrap();
        let config = BridgeConfig {
            content_types: vec!["stream:chat".into()],
            ..BridgeConfig::default()
        };
        let parts = provisioner.provision(&config).unwrap();
        let broker = Broker::open(parts, config).await.unwrap();
        assert_eq!(broker.local_peer().content_hashes(), vec![root.hash()]);

        let holders = provisioner
            .resolver()
            .lookup(&LookupCriteria::ContentHash(root.hash()))
            .await
            .unwrap();
        assert_eq!(holders, vec![broker.connection_info()]);
    }

    #[tokio::test]
    async fn put_advertises_registered_content() {
        let config = BridgeConfig {
            content_types: vec!["stream:chat".into()],
            ..BridgeConfig::default()
        };
        let (broker, provisioner) = broker_with(config).await;
        let root = broker
            .put(envelope::decode(br#"{"type":"stream:chat"}"#).unwrap())
            .await
            .unwrap();
        let note = broker.put(draft("plain", "@peer")).await.unwrap();

        let resolver = provisioner.resolver();
        let holders = resolver
            .lookup(&LookupCriteria::ContentHash(root.hash()))
            .await
            .unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(&holders[0].public_key, broker.local_peer().peer_public_key());
        let holders = resolver
            .lookup(&LookupCriteria::ContentHash(note.hash()))
            .await
            .unwrap();
        assert!(holders.is_empty());
    }

    #[tokio::test]
    async fn dispatch_version_and_connection_info() {
        let broker = broker().await;
        let version = broker.dispatch(Operation::Version, Vec::new()).await.unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION").as_bytes());

        let info = broker
            .dispatch(Operation::GetConnectionInfo, Vec::new())
            .await
            .unwrap();
        let info: Value = serde_json::from_slice(&info).unwrap();
        assert_eq!(info["type"], json!(strand_net::CONNECTION_INFO_TYPE));
        assert_eq!(
            info["owner"],
            json!(broker.local_peer().peer_public_key().as_str())
        );
    }

    #[tokio::test]
    async fn dispatch_rejects_non_utf8_tokens() {
        let broker = broker().await;
        let err = broker
            .dispatch(Operation::Pop, vec![0xff, 0xfe])
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidPayload(_)));
    }
}
