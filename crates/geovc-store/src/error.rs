use geovc_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The stored bytes are malformed or fail digest verification.
    #[error("corrupt object {id}: {source}")]
    Corrupt {
        id: ObjectId,
        #[source]
        source: geovc_codec::CodecError,
    },

    /// Write attempted against a store opened read-only.
    #[error("store is read-only")]
    ReadOnly,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
