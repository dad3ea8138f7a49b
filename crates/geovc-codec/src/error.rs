use geovc_types::ObjectId;

/// Errors raised while decoding or verifying canonical bytes.
///
/// Every variant means the same thing to callers: the object is corrupt or
/// was not produced by this codec. The store surfaces these as corruption of
/// the id the bytes were fetched by.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Input ended before the encoding was complete.
    #[error("corrupt object: unexpected end of input")]
    UnexpectedEof,

    /// An enum discriminant byte had no defined meaning.
    #[error("corrupt object: bad {what} tag {value:#04x}")]
    BadTag { what: &'static str, value: u8 },

    /// A length-prefixed string was not valid UTF-8.
    #[error("corrupt object: invalid UTF-8 in string field")]
    InvalidUtf8,

    /// Bytes remained after the object was fully decoded.
    #[error("corrupt object: {0} trailing byte(s) after end of encoding")]
    TrailingBytes(usize),

    /// Tree entries or buckets were not in strictly ascending canonical order.
    #[error("corrupt object: canonical ordering violated at {0:?}")]
    UnsortedEntries(String),

    /// The decoded bytes do not hash to the id they were fetched by.
    #[error("corrupt object: digest mismatch, expected {expected}, computed {computed}")]
    HashMismatch {
        expected: ObjectId,
        computed: ObjectId,
    },
}

/// Convenience alias for codec results.
pub type CodecResult<T> = Result<T, CodecError>;
