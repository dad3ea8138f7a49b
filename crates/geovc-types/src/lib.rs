//! Foundation types for geovc, a distributed version-control engine for
//! geospatial feature collections.
//!
//! This crate provides the revision object model shared by every other geovc
//! crate. Objects are immutable and content-addressed: an object's identity
//! is the BLAKE3 hash of its canonical byte encoding (see `geovc-codec`).
//!
//! # Key Types
//!
//! - [`ObjectId`]: content-addressed identifier (BLAKE3 hash)
//! - [`RevObject`]: tagged union over commit/tree/feature/feature-type/tag
//! - [`RevTree`] / [`NodeEntry`]: the sharded canonical tree and its entries
//! - [`Envelope`]: bounding extent used for spatial pruning
//! - [`PersonIdent`]: author/committer identity with timestamp

pub mod attribute;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod object_id;
pub mod revision;

pub use attribute::{AttributeDescriptor, AttributeKind, AttributeValue};
pub use envelope::Envelope;
pub use error::TypeError;
pub use identity::PersonIdent;
pub use object_id::ObjectId;
pub use revision::{
    Bucket, EntryKind, NodeEntry, ObjectKind, RevCommit, RevFeature, RevFeatureType, RevObject,
    RevTag, RevTree, TreeNode,
};
