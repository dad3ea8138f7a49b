use geovc_types::ObjectId;

/// Errors that can occur during a merge.
///
/// Conflicting edits are not an error: they come back as data in
/// [`MergeOutcome::Conflicts`](crate::MergeOutcome::Conflicts).
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The two commits share no ancestry at all.
    #[error("no common ancestor between {ours} and {theirs}")]
    NoMergeBase { ours: ObjectId, theirs: ObjectId },

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

    /// Graph query failed.
    #[error("graph error: {0}")]
    Graph(#[from] geovc_graph::GraphError),

    /// Diff traversal failed.
    #[error("diff error: {0}")]
    Diff(#[from] geovc_diff::DiffError),

    /// Canonical tree operation failed.
    #[error("tree error: {0}")]
    Tree(#[from] geovc_tree::TreeError),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
