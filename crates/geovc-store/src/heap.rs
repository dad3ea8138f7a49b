use std::collections::HashMap;
use std::sync::RwLock;

use geovc_types::{ObjectId, RevObject};
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::hints::StoreHints;
use crate::traits::{BlobStore, ObjectStore};

/// In-memory, HashMap-based object store.
///
/// The reference [`ObjectStore`] backend for tests and embedding. Stored
/// values are the canonical encodings, byte-for-byte; `get` decodes and
/// verifies the digest on every read.
pub struct HeapObjectStore {
    objects: RwLock<HashMap<ObjectId, Vec<u8>>>,
    read_only: bool,
}

impl HeapObjectStore {
    /// Create an empty writable store.
    pub fn new() -> Self {
        Self::with_hints(StoreHints::default())
    }

    /// Create a store with explicit open hints.
    pub fn with_hints(hints: StoreHints) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            read_only: hints.objects_read_only,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored encodings.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Remove all objects.
    pub fn clear(&self) {
        self.objects.write().expect("lock poisoned").clear();
    }

    /// Sorted list of all object ids in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.objects.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for HeapObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for HeapObjectStore {
    fn put(&self, object: &RevObject) -> StoreResult<ObjectId> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        let bytes = geovc_codec::encode(object);
        let id = geovc_codec::hash(&bytes);
        let mut map = self.objects.write().expect("lock poisoned");
        // Idempotent: an existing id already holds these exact bytes.
        if let std::collections::hash_map::Entry::Vacant(slot) = map.entry(id) {
            slot.insert(bytes);
            trace!(id = %id.short_hex(), kind = %object.kind(), "stored object");
        }
        Ok(id)
    }

    fn get(&self, id: &ObjectId) -> StoreResult<RevObject> {
        let map = self.objects.read().expect("lock poisoned");
        let bytes = map.get(id).ok_or(StoreError::NotFound(*id))?;
        geovc_codec::decode_verified(bytes, id).map_err(|source| StoreError::Corrupt {
            id: *id,
            source,
        })
    }

    fn has(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        let mut map = self.objects.write().expect("lock poisoned");
        Ok(map.remove(id).is_some())
    }
}

impl std::fmt::Debug for HeapObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapObjectStore")
            .field("object_count", &self.len())
            .field("read_only", &self.read_only)
            .finish()
    }
}

/// In-memory blob store for opaque binary payloads.
pub struct HeapBlobStore {
    blobs: RwLock<HashMap<ObjectId, Vec<u8>>>,
}

impl HeapBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }
}

impl Default for HeapBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for HeapBlobStore {
    fn put_blob(&self, bytes: &[u8]) -> StoreResult<ObjectId> {
        let id = ObjectId::from_bytes(bytes);
        let mut map = self.blobs.write().expect("lock poisoned");
        map.entry(id).or_insert_with(|| bytes.to_vec());
        Ok(id)
    }

    fn get_blob(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let map = self.blobs.read().expect("lock poisoned");
        map.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    fn has_blob(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }

    fn delete_blob(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(id).is_some())
    }
}
