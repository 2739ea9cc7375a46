//! Foundation types for strand.
//!
//! Every other strand crate depends on `strand-types`. It defines the
//! immutable, content-addressed [`Object`] record and the identifiers that
//! refer to objects and their owners.
//!
//! # Key Types
//!
//! - [`ObjectHash`]: content-addressed identifier (BLAKE3 over the canonical encoding)
//! - [`PublicKey`]: owner or peer key, kept in its textual form
//! - [`OwnerSpec`]: owner as supplied by a caller, possibly a `@peer` / `@identity` directive
//! - [`Object`]: immutable record: type, metadata, and data fields
//! - [`ObjectDraft`]: caller-supplied object whose owner is not yet resolved

pub mod error;
pub mod hash;
pub mod key;
pub mod object;

pub use error::TypeError;
pub use hash::ObjectHash;
pub use key::{OwnerSpec, PublicKey};
pub use object::{Metadata, Object, ObjectDraft};

/// Field values carried by objects.
pub use serde_json::Value;
