//! Canonical serialization and content hashing for geovc revision objects.
//!
//! Content addressing only works if every writer produces the same bytes for
//! the same logical object, so the encoding here is fixed once and applied
//! uniformly. No serde format is involved in anything that gets hashed.
//!
//! # Canonical rules
//!
//! - The first byte is the object-kind discriminant. This also separates the
//!   hash domains of the kinds: a feature and a tree can never share an id.
//! - Integers are fixed-width big-endian; `f64` is its IEEE-754 bit pattern,
//!   big-endian.
//! - Strings are `u32` length-prefixed UTF-8; byte arrays likewise.
//! - Sequences are `u32` count-prefixed. Tree entries are serialized in
//!   ascending name order and buckets in ascending index order; all other
//!   fields follow their declared order. Map iteration order is never used.
//! - `Option` is a presence byte (0/1) followed by the value.
//!
//! [`decode`] rejects malformed input; [`decode_verified`] additionally
//! rejects bytes whose digest does not match the id they were fetched by.

pub mod decode;
pub mod encode;
pub mod error;

pub use decode::{decode, decode_verified};
pub use encode::encode;
pub use error::{CodecError, CodecResult};

use geovc_types::{ObjectId, RevObject};

/// Hash canonical bytes into an [`ObjectId`].
pub fn hash(bytes: &[u8]) -> ObjectId {
    ObjectId::from_hash(*blake3::hash(bytes).as_bytes())
}

/// The content-addressed id of an object: hash of its canonical encoding.
pub fn id_of(object: &RevObject) -> ObjectId {
    hash(&encode(object))
}
