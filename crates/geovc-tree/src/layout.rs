//! Sharding constants and the bucket routing rule.
//!
//! These are deployment constants: changing any of them changes every tree
//! hash, so they are fixed here once. Determinism under these values is
//! covered by the order-independence property test in `builder`.

/// Maximum entries a subtree may hold before it shards into buckets.
pub const LEAF_THRESHOLD: usize = 32;

/// Bucket fanout per level. Power of two; one hex nibble of the name hash.
pub const BUCKET_COUNT: usize = 16;

/// Bits of the name hash consumed per tree level (`log2(BUCKET_COUNT)`).
pub const BUCKET_BITS: u32 = 4;

/// Deepest level at which a node may shard. A BLAKE3 hash yields 64 nibbles;
/// past that a node stays a leaf whatever its size (unreachable in practice,
/// it would take colliding 256-bit prefixes).
pub const MAX_DEPTH: usize = 64;

/// The bucket an entry name routes to at a given tree depth.
///
/// Consumes the hash top-down: depth 0 uses the high nibble of byte 0,
/// depth 1 the low nibble of byte 0, and so on. Must match at build time and
/// lookup time, which is why it lives here and nowhere else.
pub fn bucket_index(name: &str, depth: usize) -> u8 {
    debug_assert!(depth < MAX_DEPTH);
    let hash = blake3::hash(name.as_bytes());
    let byte = hash.as_bytes()[depth / 2];
    if depth % 2 == 0 {
        byte >> BUCKET_BITS
    } else {
        byte & (BUCKET_COUNT as u8 - 1)
    }
}
