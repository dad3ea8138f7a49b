//! The canonical tree: a persistent, auto-sharding hash-trie representing an
//! immutable snapshot of a keyed feature collection.
//!
//! A node holds its entries inline while the subtree has at most
//! [`LEAF_THRESHOLD`] of them; above that, entries are redistributed into
//! [`BUCKET_COUNT`] buckets by successive nibbles of the BLAKE3 hash of the
//! entry name, each non-empty bucket becoming its own canonical tree built by
//! the same rule. The resulting shape is a pure function of the entry set:
//! two trees with the same logical entries always hash identically, no
//! matter how they were assembled.
//!
//! [`insert`] and [`remove`] are copy-on-write: only the path from the root
//! to the touched leaf gets new ids, untouched buckets keep theirs. That
//! structural sharing is what lets the diff engine skip unchanged subtrees
//! by id equality alone.

pub mod builder;
pub mod error;
pub mod layout;

pub use builder::{build, collect_entries, get, insert, put_empty, remove};
pub use error::{TreeError, TreeResult};
pub use layout::{bucket_index, BUCKET_BITS, BUCKET_COUNT, LEAF_THRESHOLD, MAX_DEPTH};
