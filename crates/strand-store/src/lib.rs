//! Content-addressed object storage for strand.
//!
//! Objects are immutable and keyed by their [`ObjectHash`]. Queries are
//! expressed as a [`FilterSet`] built from typed [`Lookup`] clauses and
//! answered with a sequential [`ObjectReader`].
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- insertion-ordered store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Writes are idempotent: the same content is stored once.
//! 3. Readers returned by `filter` are finite and terminate.
//! 4. All backend errors are propagated, never silently ignored.
//!
//! [`ObjectHash`]: strand_types::ObjectHash

pub mod error;
pub mod filter;
pub mod memory;
pub mod reader;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use filter::{FilterSet, Lookup, OrderBy, OrderDirection, Page};
pub use memory::InMemoryObjectStore;
pub use reader::{read_all, BoxedReader, ObjectReader, VecReader};
pub use traits::ObjectStore;
