use std::collections::HashMap;
use std::sync::RwLock;

use strand_types::{Object, ObjectHash};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::filter::FilterSet;
use crate::reader::{BoxedReader, VecReader};
use crate::traits::ObjectStore;

#[derive(Default)]
struct Inner {
    order: Vec<ObjectHash>,
    objects: HashMap<ObjectHash, Object>,
}

/// In-memory, insertion-ordered object store.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock` for safe concurrent access. Objects are cloned on read/write.
/// Unordered filters return matches in the order they were first written.
pub struct InMemoryObjectStore {
    inner: RwLock<Inner>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").order.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hashes of all stored objects, in insertion order.
    pub fn hashes(&self) -> Vec<ObjectHash> {
        self.inner.read().expect("lock poisoned").order.clone()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn insert(&self, object: &Object) -> StoreResult<bool> {
        if object.object_type().is_empty() {
            return Err(StoreError::MissingType);
        }
        let hash = object.hash();
        let mut inner = self.inner.write().expect("lock poisoned");
        // Idempotent: content-addressing guarantees the same hash always
        // maps to the same content.
        if inner.objects.contains_key(&hash) {
            return Ok(false);
        }
        debug!(hash = hash.short(), object_type = object.object_type(), "object stored");
        inner.order.push(hash.clone());
        inner.objects.insert(hash, object.clone());
        Ok(true)
    }

    fn get(&self, hash: &ObjectHash) -> StoreResult<Option<Object>> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner.objects.get(hash).cloned())
    }

    fn filter(&self, filter: &FilterSet) -> StoreResult<BoxedReader> {
        let rows: Vec<(ObjectHash, Object)> = {
            let inner = self.inner.read().expect("lock poisoned");
            inner
                .order
                .iter()
                .filter_map(|hash| {
                    let object = inner.objects.get(hash)?;
                    filter
                        .matches(object, hash)
                        .then(|| (hash.clone(), object.clone()))
                })
                .collect()
        };
        Ok(Box::new(VecReader::new(filter.arrange(rows))))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}
