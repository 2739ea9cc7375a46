use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::hash::ObjectHash;
use crate::key::{OwnerSpec, PublicKey};

/// Envelope field carrying the object type.
pub const TYPE_FIELD: &str = "type";
/// Envelope field carrying the owner key.
pub const OWNER_FIELD: &str = "owner";
/// Envelope field carrying the stream root hash.
pub const STREAM_FIELD: &str = "stream";
/// Envelope field carrying the derived object hash.
pub const HASH_FIELD: &str = "_hash";

/// Field names that live in the envelope but never in an object's data.
pub const RESERVED_FIELDS: [&str; 4] = [TYPE_FIELD, OWNER_FIELD, STREAM_FIELD, HASH_FIELD];

/// Domain tag prepended to the canonical encoding before hashing.
const OBJECT_DOMAIN: &[u8] = b"strand-object-v1:";

/// Object metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Owner key. Always a concrete key once stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<PublicKey>,
    /// Root of the append-only stream this object belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<ObjectHash>,
}

/// Immutable, content-addressed record.
///
/// An object is its type, its [`Metadata`], and a map of data fields whose
/// values may be scalars or nested maps and sequences. The hash is derived
/// from the canonical encoding of all three: data keys are kept sorted, so
/// two objects with the same content always hash identically. Any change
/// produces a new object with a new hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Object {
    #[serde(rename = "type")]
    object_type: String,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    data: BTreeMap<String, Value>,
}

impl Object {
    /// Create an empty object of the given type.
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            metadata: Metadata::default(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_owner(mut self, owner: PublicKey) -> Self {
        self.metadata.owner = Some(owner);
        self
    }

    pub fn with_stream(mut self, root: ObjectHash) -> Self {
        self.metadata.stream = Some(root);
        self
    }

    /// Add a data field. Reserved envelope names are rejected.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Result<Self, TypeError> {
        self.set_field(name, value)?;
        Ok(self)
    }

    /// Set a data field. Reserved envelope names are rejected.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> Result<(), TypeError> {
        let name = name.into();
        if RESERVED_FIELDS.contains(&name.as_str()) {
            return Err(TypeError::ReservedField(name));
        }
        self.data.insert(name, value);
        Ok(())
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn owner(&self) -> Option<&PublicKey> {
        self.metadata.owner.as_ref()
    }

    pub fn stream(&self) -> Option<&ObjectHash> {
        self.metadata.stream.as_ref()
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    /// Compute the content hash.
    pub fn hash(&self) -> ObjectHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(OBJECT_DOMAIN);
        // Only string keys and JSON values are written, which cannot fail.
        serde_json::to_writer(&mut hasher, self).expect("canonical object encoding is infallible");
        ObjectHash::from_digest(*hasher.finalize().as_bytes())
    }
}

/// An object as supplied by a caller, with its owner still unresolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDraft {
    pub object_type: String,
    pub owner: Option<OwnerSpec>,
    pub stream: Option<ObjectHash>,
    pub data: BTreeMap<String, Value>,
}

impl ObjectDraft {
    /// Resolve the owner directive and produce the immutable object.
    pub fn resolve(
        self,
        peer: &PublicKey,
        identity: Option<&PublicKey>,
    ) -> Result<Object, TypeError> {
        let owner = self
            .owner
            .map(|spec| spec.resolve(peer, identity))
            .transpose()?;
        let mut object = Object::new(self.object_type);
        object.metadata = Metadata {
            owner,
            stream: self.stream,
        };
        for (name, value) in self.data {
            object.set_field(name, value)?;
        }
        Ok(object)
    }
}

impl From<Object> for ObjectDraft {
    fn from(object: Object) -> Self {
        Self {
            object_type: object.object_type,
            owner: object.metadata.owner.map(OwnerSpec::Key),
            stream: object.metadata.stream,
            data: object.data,
        }
    }
}
