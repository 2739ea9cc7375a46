//! Object manager for strand.
//!
//! Sits between callers and the object store: every write is persisted and
//! then fanned out to live subscribers whose filter matches, and objects
//! held by remote peers are fetched through the network and persisted
//! locally.

pub mod error;
pub mod manager;
pub mod reader;
pub mod router;

pub use error::{ManagerError, ManagerResult};
pub use manager::{LocalObjectManager, ObjectManager};
pub use reader::LiveReader;
