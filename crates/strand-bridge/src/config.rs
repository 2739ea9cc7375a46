use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strand_net::ConnectionInfo;

use crate::error::{BridgeError, BridgeResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bound on `pop` and on store/manager calls made for one operation.
    pub call_timeout_ms: u64,
    /// Bound on the resolver lookup and each background peer fetch.
    pub request_stream_timeout_ms: u64,
    pub worker_threads: usize,
    pub log_level: String,
    /// Hex Ed25519 secret. A fresh key is generated when absent.
    pub peer_key: Option<String>,
    /// Hex Ed25519 secret backing `@identity`.
    pub identity_key: Option<String>,
    pub addresses: Vec<String>,
    pub bootstrap_peers: Vec<ConnectionInfo>,
    /// Object types whose hashes the local peer advertises as held.
    pub content_types: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 3_000,
            request_stream_timeout_ms: 10_000,
            worker_threads: 2,
            log_level: "info".to_string(),
            peer_key: None,
            identity_key: None,
            addresses: Vec::new(),
            bootstrap_peers: Vec::new(),
            content_types: Vec::new(),
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(s: &str) -> BridgeResult<Self> {
        toml::from_str(s).map_err(|e| BridgeError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn request_stream_timeout(&self) -> Duration {
        Duration::from_millis(self.request_stream_timeout_ms)
    }
}
