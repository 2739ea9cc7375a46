use strand_types::{Object, ObjectHash};

use crate::error::StoreResult;
use crate::filter::FilterSet;
use crate::reader::BoxedReader;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same content always produces
///   the same hash, so writing it twice is a no-op.
/// - `filter` returns a finite reader that terminates.
/// - Concurrent reads are always safe (objects are immutable).
/// - All backend errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Persist an object. Returns `true` only for the write that first
    /// stored this content; the check and the write are one atomic step.
    fn insert(&self, object: &Object) -> StoreResult<bool>;

    /// Persist an object and return the stored copy.
    fn put(&self, object: Object) -> StoreResult<Object> {
        self.insert(&object)?;
        Ok(object)
    }

    /// Read an object by hash. `Ok(None)` if it does not exist.
    fn get(&self, hash: &ObjectHash) -> StoreResult<Option<Object>>;

    /// Open a finite reader over every stored object matching the filter.
    fn filter(&self, filter: &FilterSet) -> StoreResult<BoxedReader>;

    /// Check whether an object exists in the store.
    fn contains(&self, hash: &ObjectHash) -> StoreResult<bool> {
        Ok(self.get(hash)?.is_some())
    }
}
