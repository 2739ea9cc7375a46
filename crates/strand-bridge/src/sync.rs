use std::sync::Arc;
use std::time::Duration;

use strand_manager::ObjectManager;
use strand_net::{ConnectionInfo, LookupCriteria, Resolver};
use strand_store::read_all;
use strand_types::{ObjectHash, PublicKey};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, BridgeResult};

/// Pulls remote content into the local store in the background.
pub struct SyncOrchestrator {
    resolver: Arc<dyn Resolver>,
    manager: Arc<dyn ObjectManager>,
    local: PublicKey,
    timeout: Duration,
}

impl SyncOrchestrator {
    /// `local` is this peer's key; it is never fetched from.
    pub fn new(
        resolver: Arc<dyn Resolver>,
        manager: Arc<dyn ObjectManager>,
        local: PublicKey,
        timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            manager,
            local,
            timeout,
        }
    }

    /// Find the holders of `hash` and fetch its stream from each of them.
    ///
    /// Only the resolver lookup is awaited. One task per holder is spawned
    /// and left running; their failures are logged and dropped. The handles
    /// are returned for callers that want to wait.
    pub async fn request_stream(&self, hash: &ObjectHash) -> BridgeResult<Vec<JoinHandle<()>>> {
        let criteria = LookupCriteria::ContentHash(hash.clone());
        let peers = tokio::time::timeout(self.timeout, self.resolver.lookup(&criteria))
            .await
            .map_err(|_| BridgeError::Timeout(self.timeout.as_millis() as u64))??;
        let peers: Vec<ConnectionInfo> = peers
            .into_iter()
            .filter(|peer| peer.public_key != self.local)
            .collect();
        info!(hash = hash.short(), peers = peers.len(), "requesting stream");

        let handles = peers
            .into_iter()
            .map(|peer| {
                let manager = self.manager.clone();
                let hash = hash.clone();
                let timeout = self.timeout;
                tokio::spawn(async move {
                    let key = peer.public_key.clone();
                    match tokio::time::timeout(timeout, fetch_from(manager, &hash, peer)).await {
                        Ok(Ok(count)) => {
                            debug!(hash = hash.short(), peer = %key, count, "stream synced")
                        }
                        Ok(Err(e)) => {
                            warn!(hash = hash.short(), peer = %key, error = %e, "stream sync failed")
                        }
                        Err(_) => {
                            warn!(hash = hash.short(), peer = %key, "stream sync timed out")
                        }
                    }
                })
            })
            .collect();
        Ok(handles)
    }
}

async fn fetch_from(
    manager: Arc<dyn ObjectManager>,
    hash: &ObjectHash,
    peer: ConnectionInfo,
) -> BridgeResult<usize> {
    manager.request(hash, &peer).await?;
    let mut reader = manager
        .request_stream(hash, std::slice::from_ref(&peer))
        .await?;
    let drained = read_all(reader.as_mut()).await;
    reader.close();
    Ok(drained?.len())
}
