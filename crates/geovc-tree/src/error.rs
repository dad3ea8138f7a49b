use geovc_types::ObjectId;

/// Errors that can occur during canonical tree operations.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The id referenced where a tree was expected resolved to another kind.
    #[error("object {id} is a {actual}, expected a tree")]
    NotATree { id: ObjectId, actual: String },

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] geovc_store::StoreError),
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
