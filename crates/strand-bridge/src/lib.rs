//! Synchronous call boundary for strand.
//!
//! A foreign caller drives everything through [`Bridge::call`]: an
//! operation name and an opaque payload in, a [`Reply`] out. Behind it a
//! [`Broker`] owns the collaborators, the table of open subscriptions, and
//! the background sync of remote streams.
//!
//! # Operations
//!
//! | name | payload | reply |
//! |---|---|---|
//! | `init` | ignored | empty |
//! | `get` | `{lookups, orderBy, orderDir, limit, offset}` | `{objectBodies}` |
//! | `put` | envelope | stored envelope |
//! | `subscribe` | lookup clause | token |
//! | `pop` | token | envelope |
//! | `cancel` | token | empty |
//! | `requestStream` | content hash | empty |
//! | `getFeedRootHash` | object type | hash |
//! | `getConnectionInfo` | ignored | envelope |
//! | `version` | ignored | version string |

pub mod bridge;
pub mod broker;
pub mod config;
pub mod envelope;
pub mod error;
pub mod lookup;
pub mod operation;
pub mod provision;
pub mod registry;
pub mod sync;

pub use bridge::{Bridge, Reply};
pub use broker::{version, Broker};
pub use config::BridgeConfig;
pub use envelope::{GetRequest, GetResponse};
pub use error::{BridgeError, BridgeResult};
pub use lookup::{compile, CompileMode};
pub use operation::Operation;
pub use provision::{Collaborators, InMemoryProvisioner, Provisioner};
pub use registry::{Subscription, SubscriptionRegistry};
pub use sync::SyncOrchestrator;
