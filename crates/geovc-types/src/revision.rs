use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeDescriptor, AttributeValue};
use crate::envelope::Envelope;
use crate::identity::PersonIdent;
use crate::object_id::ObjectId;

/// Kind discriminant for a revision object.
///
/// The discriminant is the first byte of the canonical encoding, so two
/// objects of different kinds can never collide on an id even when their
/// payload bytes happen to match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Commit,
    Tree,
    Feature,
    FeatureType,
    Tag,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Tree => write!(f, "tree"),
            Self::Feature => write!(f, "feature"),
            Self::FeatureType => write!(f, "featuretype"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

/// What a tree entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntryKind {
    Feature,
    Tree,
}

/// A single named entry of a canonical tree leaf.
///
/// `metadata_id` references the [`RevFeatureType`] the child conforms to, so
/// schema changes are visible to the diff engine without fetching feature
/// payloads. `extent` is the child's spatial bound, if known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub name: String,
    pub object_id: ObjectId,
    pub kind: EntryKind,
    pub metadata_id: Option<ObjectId>,
    pub extent: Option<Envelope>,
}

impl NodeEntry {
    pub fn new(name: impl Into<String>, object_id: ObjectId, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            object_id,
            kind,
            metadata_id: None,
            extent: None,
        }
    }

    pub fn feature(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self::new(name, object_id, EntryKind::Feature)
    }

    pub fn subtree(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self::new(name, object_id, EntryKind::Tree)
    }

    pub fn with_metadata(mut self, metadata_id: ObjectId) -> Self {
        self.metadata_id = Some(metadata_id);
        self
    }

    pub fn with_extent(mut self, extent: Envelope) -> Self {
        self.extent = Some(extent);
        self
    }
}

/// One bucket of a sharded tree node: the bucket index paired with the id of
/// the subtree holding every entry that hashes into that bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub index: u8,
    pub tree_id: ObjectId,
}

impl Bucket {
    pub fn new(index: u8, tree_id: ObjectId) -> Self {
        Self { index, tree_id }
    }
}

/// The shape of a canonical tree node: inline entries while small, bucketed
/// once the entry count crosses the sharding threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Entries held inline, sorted by name.
    Leaf { entries: Vec<NodeEntry> },
    /// Non-empty buckets, sorted by index. Each bucket is itself a tree.
    Buckets { buckets: Vec<Bucket> },
}

/// A snapshot of a keyed feature collection as a persistent hash-trie node.
///
/// `size` counts every leaf entry in the whole subtree; `extent` is the union
/// of the extents beneath it. Both are denormalized summaries: they let
/// callers answer "how big" and "roughly where" without walking the subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevTree {
    pub size: u64,
    pub extent: Option<Envelope>,
    pub node: TreeNode,
}

impl RevTree {
    /// The empty tree: a leaf with no entries.
    pub fn empty() -> Self {
        Self {
            size: 0,
            extent: None,
            node: TreeNode::Leaf {
                entries: Vec::new(),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns `true` if this node holds entries inline.
    pub fn is_leaf(&self) -> bool {
        matches!(self.node, TreeNode::Leaf { .. })
    }

    /// The inline entries of a leaf node, or `None` for a bucketed node.
    pub fn entries(&self) -> Option<&[NodeEntry]> {
        match &self.node {
            TreeNode::Leaf { entries } => Some(entries),
            TreeNode::Buckets { .. } => None,
        }
    }

    /// The buckets of a sharded node, or `None` for a leaf.
    pub fn buckets(&self) -> Option<&[Bucket]> {
        match &self.node {
            TreeNode::Buckets { buckets } => Some(buckets),
            TreeNode::Leaf { .. } => None,
        }
    }
}

/// An immutable commit: a tree snapshot plus its ancestry and authorship.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevCommit {
    pub tree_id: ObjectId,
    /// Zero for a root commit, two or more for a merge commit.
    pub parent_ids: Vec<ObjectId>,
    pub author: PersonIdent,
    pub committer: PersonIdent,
    pub message: String,
}

impl RevCommit {
    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }
}

/// A feature: an ordered sequence of attribute values conforming to a
/// [`RevFeatureType`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevFeature {
    pub values: Vec<AttributeValue>,
}

impl RevFeature {
    pub fn new(values: Vec<AttributeValue>) -> Self {
        Self { values }
    }

    /// Union of the extents of every geometry value.
    pub fn extent(&self) -> Option<Envelope> {
        let mut env = Envelope::null();
        for value in &self.values {
            if let Some(e) = value.envelope() {
                env.expand_to_include(&e);
            }
        }
        if env.is_null() {
            None
        } else {
            Some(env)
        }
    }
}

/// A feature schema: ordered attribute name/type pairs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevFeatureType {
    pub name: String,
    pub attributes: Vec<AttributeDescriptor>,
}

impl RevFeatureType {
    pub fn new(name: impl Into<String>, attributes: Vec<AttributeDescriptor>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }
}

/// An annotated tag naming a commit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevTag {
    pub name: String,
    pub commit_id: ObjectId,
    pub message: String,
    pub tagger: PersonIdent,
}

/// A revision object: the tagged union stored in the object database.
///
/// Pattern-match on the variant; there is no virtual dispatch anywhere in
/// the object model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RevObject {
    Commit(RevCommit),
    Tree(RevTree),
    Feature(RevFeature),
    FeatureType(RevFeatureType),
    Tag(RevTag),
}

impl RevObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Feature(_) => ObjectKind::Feature,
            Self::FeatureType(_) => ObjectKind::FeatureType,
            Self::Tag(_) => ObjectKind::Tag,
        }
    }

    pub fn as_commit(&self) -> Option<&RevCommit> {
        match self {
            Self::Commit(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&RevTree> {
        match self {
            Self::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_feature(&self) -> Option<&RevFeature> {
        match self {
            Self::Feature(f) => Some(f),
            _ => None,
        }
    }

    pub fn into_commit(self) -> Option<RevCommit> {
        match self {
            Self::Commit(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_tree(self) -> Option<RevTree> {
        match self {
            Self::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_feature(self) -> Option<RevFeature> {
        match self {
            Self::Feature(f) => Some(f),
            _ => None,
        }
    }

    pub fn into_feature_type(self) -> Option<RevFeatureType> {
        match self {
            Self::FeatureType(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_tag(self) -> Option<RevTag> {
        match self {
            Self::Tag(t) => Some(t),
            _ => None,
        }
    }
}
