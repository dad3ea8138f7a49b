use geovc_types::ObjectId;

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// An id resolved to an unexpected object kind.
    #[error("object {id} is a {actual}, expected {expected}")]
    UnexpectedKind {
        id: ObjectId,
        expected: &'static str,
        actual: String,
    },

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] geovc_store::StoreError),

    /// Canonical tree operation failed.
    #[error("tree error: {0}")]
    Tree(#[from] geovc_tree::TreeError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
