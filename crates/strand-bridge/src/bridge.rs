use std::sync::{Arc, RwLock};

use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::broker::Broker;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::operation::Operation;
use crate::provision::{InMemoryProvisioner, Provisioner};

/// Result of one boundary call: a payload or an error message, never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Payload(Vec<u8>),
    Error(String),
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Payload(_))
    }

    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Payload(bytes) => Some(bytes.as_slice()),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Payload(_) => None,
            Self::Error(message) => Some(message.as_str()),
        }
    }

    pub fn into_result(self) -> Result<Vec<u8>, String> {
        match self {
            Self::Payload(bytes) => Ok(bytes),
            Self::Error(message) => Err(message),
        }
    }
}

struct Session {
    runtime: Runtime,
    broker: Arc<Broker>,
}

enum State {
    Uninitialized,
    Ready(Arc<Session>),
}

/// Synchronous entry point for foreign callers.
///
/// `call` blocks the calling thread for the length of one operation. The
/// bridge owns its own runtime, so it must not be called from inside
/// another tokio runtime.
pub struct Bridge {
    config: BridgeConfig,
    provisioner: Box<dyn Provisioner>,
    state: RwLock<State>,
}

impl Bridge {
    /// Bridge over the in-process collaborators.
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_provisioner(config, InMemoryProvisioner::new())
    }

    pub fn with_provisioner(config: BridgeConfig, provisioner: impl Provisioner + 'static) -> Self {
        Self {
            config,
            provisioner: Box::new(provisioner),
            state: RwLock::new(State::Uninitialized),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.read().expect("state lock poisoned"), State::Ready(_))
    }

    /// Run the named operation. Every failure comes back as `Reply::Error`.
    pub fn call(&self, name: &str, payload: &[u8]) -> Reply {
        debug!(op = name, bytes = payload.len(), "bridge call");
        match self.try_call(name, payload) {
            Ok(bytes) => Reply::Payload(bytes),
            Err(e) => {
                warn!(op = name, error = %e, "bridge call failed");
                Reply::Error(e.to_string())
            }
        }
    }

    fn try_call(&self, name: &str, payload: &[u8]) -> BridgeResult<Vec<u8>> {
        let op: Operation = name.parse()?;
        if op == Operation::Init {
            self.init()?;
            return Ok(Vec::new());
        }
        let session = self.session()?;
        let broker = session.broker.clone();
        let payload = payload.to_vec();
        // A panic in the operation ends its task, not the caller.
        let task = session
            .runtime
            .spawn(async move { broker.dispatch(op, payload).await });
        session
            .runtime
            .block_on(task)
            .map_err(|e| BridgeError::Internal(e.to_string()))?
    }

    fn session(&self) -> BridgeResult<Arc<Session>> {
        match &*self.state.read().expect("state lock poisoned") {
            State::Ready(session) => Ok(session.clone()),
            State::Uninitialized => Err(BridgeError::NotInitialized),
        }
    }

    /// Build the runtime and collaborators. A second call does nothing.
    pub fn init(&self) -> BridgeResult<()> {
        let mut state = self.state.write().expect("state lock poisoned");
        if let State::Ready(_) = *state {
            debug!("bridge already initialized");
            return Ok(());
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads.max(1))
            .thread_name("strand-bridge")
            .enable_all()
            .build()?;
        let parts = self.provisioner.provision(&self.config)?;
        let broker = runtime.block_on(Broker::open(parts, self.config.clone()))?;
        info!(
            peer = %broker.local_peer().peer_public_key(),
            version = crate::broker::version(),
            "bridge initialized"
        );
        *state = State::Ready(Arc::new(Session {
            runtime,
            broker: Arc::new(broker),
        }));
        Ok(())
    }
}
