use geovc_types::{ObjectId, RevObject};

use crate::error::StoreResult;

/// Content-addressed revision object store.
///
/// Implementations must satisfy these invariants:
/// - `put` is idempotent: if the id already exists, the call is a no-op and
///   returns the existing id. Concurrent writers of identical content never
///   conflict.
/// - `get` verifies the digest of the stored bytes against the requested id
///   and fails with a corruption error on mismatch.
/// - Canonical bytes are preserved verbatim; the id of a stored object never
///   changes meaning.
/// - Reads require no locking from the caller's perspective: all content is
///   immutable.
pub trait ObjectStore: Send + Sync {
    /// Write an object, returning its content-addressed id.
    fn put(&self, object: &RevObject) -> StoreResult<ObjectId>;

    /// Read an object by id. Fails with `NotFound` if absent.
    fn get(&self, id: &ObjectId) -> StoreResult<RevObject>;

    /// Check whether an object exists.
    fn has(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Delete an object by id, returning whether it existed.
    ///
    /// Administrative garbage collection only; deleting a referenced object
    /// corrupts every tree or commit that points at it.
    fn delete(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Batched retrieval as a lazy sequence.
    ///
    /// A missing id surfaces as `Err(NotFound)` at the position it occupies,
    /// on demand, so a consumer may stop pulling at any point without paying
    /// for the rest.
    fn get_all<'a>(
        &'a self,
        ids: Vec<ObjectId>,
    ) -> Box<dyn Iterator<Item = StoreResult<RevObject>> + 'a> {
        Box::new(ids.into_iter().map(move |id| self.get(&id)))
    }
}

/// Store for opaque binary payloads outside the revision object model.
///
/// Blobs are content-addressed like objects but never decoded or interpreted
/// by the core.
pub trait BlobStore: Send + Sync {
    fn put_blob(&self, bytes: &[u8]) -> StoreResult<ObjectId>;

    fn get_blob(&self, id: &ObjectId) -> StoreResult<Vec<u8>>;

    fn has_blob(&self, id: &ObjectId) -> StoreResult<bool>;

    fn delete_blob(&self, id: &ObjectId) -> StoreResult<bool>;
}
