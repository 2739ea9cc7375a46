//! Peer-side collaborators for strand.
//!
//! The broker never talks to peers directly. It reads its own keys and
//! addresses from the [`LocalPeer`], asks a [`Resolver`] which peers hold a
//! piece of content, and fetches objects through a [`Network`].

pub mod error;
pub mod network;
pub mod peer;
pub mod resolver;

pub use error::{NetError, NetResult};
pub use network::{InMemoryNetwork, Network};
pub use peer::{ConnectionInfo, LocalPeer, CONNECTION_INFO_TYPE};
pub use resolver::{InMemoryResolver, LookupCriteria, Resolver};
