use geovc_types::ObjectId;

/// Errors that can occur during commit graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The referenced commit is not in the graph.
    #[error("commit not found in graph: {0}")]
    NotFound(ObjectId),

    /// A parent reference points at a commit the graph has never seen.
    #[error("commit {commit} references missing parent {parent}")]
    MissingParent { commit: ObjectId, parent: ObjectId },

    /// The edge insertion would make a commit its own ancestor.
    ///
    /// Only reachable by re-mapping an existing commit onto new parents; a
    /// brand-new commit's id is not referenced by anything yet.
    #[error("edge insertion would create a cycle through {0}")]
    CyclicGraph(ObjectId),

    /// Storage I/O error from a persisted backend.
    #[error("graph storage error: {0}")]
    Storage(String),
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
