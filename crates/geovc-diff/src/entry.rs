use geovc_types::{NodeEntry, ObjectId};

/// How a path changed between the two sides of a diff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// One changed path between two canonical trees.
///
/// `path` is the entry name, prefixed by the names of the subtrees above it
/// (`layer/feature`). The old and new sides carry the full [`NodeEntry`] so
/// consumers can reach ids, metadata, and extents without a store read.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffEntry {
    pub path: String,
    pub change: ChangeType,
    pub old: Option<NodeEntry>,
    pub new: Option<NodeEntry>,
}

impl DiffEntry {
    pub(crate) fn added(path: String, new: NodeEntry) -> Self {
        Self {
            path,
            change: ChangeType::Added,
            old: None,
            new: Some(new),
        }
    }

    pub(crate) fn removed(path: String, old: NodeEntry) -> Self {
        Self {
            path,
            change: ChangeType::Removed,
            old: Some(old),
            new: None,
        }
    }

    pub(crate) fn modified(path: String, old: NodeEntry, new: NodeEntry) -> Self {
        Self {
            path,
            change: ChangeType::Modified,
            old: Some(old),
            new: Some(new),
        }
    }

    /// Id of the object on the old side, if any.
    pub fn old_id(&self) -> Option<ObjectId> {
        self.old.as_ref().map(|e| e.object_id)
    }

    /// Id of the object on the new side, if any.
    pub fn new_id(&self) -> Option<ObjectId> {
        self.new.as_ref().map(|e| e.object_id)
    }
}
