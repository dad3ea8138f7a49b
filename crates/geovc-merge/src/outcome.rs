use geovc_types::ObjectId;

/// One path both sides changed in incompatible ways.
///
/// Any of the three ids may be absent: a path added on both sides has no
/// `base_id`, a side that deleted the path has no id of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub path: String,
    pub base_id: Option<ObjectId>,
    pub ours_id: Option<ObjectId>,
    pub theirs_id: Option<ObjectId>,
}

/// The result of a three-way merge.
#[derive(Clone, Debug, PartialEq)]
pub enum MergeOutcome {
    /// Every change was compatible; `tree_id` is the merged snapshot.
    Merged { tree_id: ObjectId },
    /// Incompatible changes, sorted by path. No partial tree is built;
    /// resolution is the caller's responsibility.
    Conflicts(Vec<Conflict>),
}

impl MergeOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }

    /// The merged tree id, if the merge was clean.
    pub fn tree_id(&self) -> Option<ObjectId> {
        match self {
            Self::Merged { tree_id } => Some(*tree_id),
            Self::Conflicts(_) => None,
        }
    }
}
