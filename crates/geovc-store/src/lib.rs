//! Content-addressed object storage contracts for geovc.
//!
//! The engine core consumes the [`ObjectStore`] and [`BlobStore`] traits;
//! everything below them is a pluggable backend. The heap backends here are
//! the reference implementations, intended for tests and embedding.
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written; content-addressing guarantees it.
//! 2. Backends store the canonical bytes byte-for-byte. A backend that
//!    re-encodes or reorders fields breaks content addressing and is
//!    non-conformant.
//! 3. `put` is idempotent: concurrent writers of identical content never
//!    conflict, the id already present wins and nothing is rewritten.
//! 4. Reads verify the digest of the bytes against the id they were fetched
//!    by; corruption surfaces immediately, never silently.
//! 5. The store never interprets object contents beyond decode/verify.

pub mod error;
pub mod heap;
pub mod hints;
pub mod manager;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use heap::{HeapBlobStore, HeapObjectStore};
pub use hints::StoreHints;
pub use manager::{Connection, ConnectionManager};
pub use traits::{BlobStore, ObjectStore};
