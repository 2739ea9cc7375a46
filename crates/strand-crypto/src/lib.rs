//! Key material for strand.
//!
//! The local peer and the local identity each hold an Ed25519 key pair. Only
//! the public half ever leaves this crate, rendered as a [`PublicKey`]
//! string that objects use as their owner.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.
//!
//! [`PublicKey`]: strand_types::PublicKey

pub mod keys;

pub use keys::{KeyError, SigningKey, PUBLIC_KEY_PREFIX};
