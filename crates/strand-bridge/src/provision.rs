use std::sync::Arc;

use strand_crypto::SigningKey;
use strand_manager::{LocalObjectManager, ObjectManager};
use strand_net::{InMemoryNetwork, InMemoryResolver, LocalPeer, Resolver};
use strand_store::{InMemoryObjectStore, ObjectStore};
use tracing::info;

use crate::config::BridgeConfig;
use crate::error::BridgeResult;

/// Handles to everything the broker talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ObjectStore>,
    pub manager: Arc<dyn ObjectManager>,
    pub resolver: Arc<dyn Resolver>,
    pub local: Arc<LocalPeer>,
}

/// Builds the collaborators when the bridge is initialized.
pub trait Provisioner: Send + Sync {
    fn provision(&self, config: &BridgeConfig) -> BridgeResult<Collaborators>;
}

/// Build the local peer described by the configuration.
pub fn local_peer(config: &BridgeConfig) -> BridgeResult<LocalPeer> {
    let peer_key = match &config.peer_key {
        Some(hex) => SigningKey::from_hex(hex)?,
        None => SigningKey::generate(),
    };
    let local = LocalPeer::new(peer_key);
    if let Some(hex) = &config.identity_key {
        local.put_identity_key(SigningKey::from_hex(hex)?);
    }
    local.put_addresses(config.addresses.iter().cloned());
    local.put_relays(config.bootstrap_peers.iter().cloned());
    local.put_content_types(config.content_types.iter().cloned());
    Ok(local)
}

/// Provisioner wiring the in-process store, resolver, and network.
///
/// The parts are shared, so a clone kept by the embedder can seed the
/// store, announce holders, or attach remote peers after `init`.
#[derive(Clone, Default)]
pub struct InMemoryProvisioner {
    store: Arc<InMemoryObjectStore>,
    network: Arc<InMemoryNetwork>,
    resolver: Arc<InMemoryResolver>,
}

impl InMemoryProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &Arc<InMemoryObjectStore> {
        &self.store
    }

    pub fn network(&self) -> &Arc<InMemoryNetwork> {
        &self.network
    }

    pub fn resolver(&self) -> &Arc<InMemoryResolver> {
        &self.resolver
    }
}

impl Provisioner for InMemoryProvisioner {
    fn provision(&self, config: &BridgeConfig) -> BridgeResult<Collaborators> {
        let local = Arc::new(local_peer(config)?);
        let manager =
            LocalObjectManager::new(self.store.clone(), self.network.clone(), local.clone());
        info!(peer = %local.peer_public_key(), "in-memory collaborators provisioned");
        Ok(Collaborators {
            store: self.store.clone(),
            manager: Arc::new(manager),
            resolver: self.resolver.clone(),
            local,
        })
    }
}
