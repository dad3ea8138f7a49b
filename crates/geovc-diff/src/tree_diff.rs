//! The lazy tree diff iterator.
//!
//! Traversal state is an explicit stack of frames: a `Pair` frame compares
//! two subtree ids, an `Entries` frame is a merge-join over two sorted entry
//! lists in progress. Each `next()` call advances just far enough to produce
//! one change, so dropping the iterator abandons the rest of the work.

use std::cmp::Ordering;

use geovc_store::ObjectStore;
use geovc_tree::BUCKET_COUNT;
use geovc_types::{EntryKind, NodeEntry, ObjectId, RevObject, RevTree, TreeNode};

use crate::entry::DiffEntry;
use crate::error::{DiffError, DiffResult};

/// Compare two canonical trees, producing a lazy sequence of changes.
///
/// Equal ids (including the root pair) are skipped without any store read.
pub fn diff<'a>(store: &'a dyn ObjectStore, left: &ObjectId, right: &ObjectId) -> TreeDiff<'a> {
    TreeDiff::new(store, *left, *right)
}

enum Frame {
    /// Two subtree ids to compare under a path prefix.
    Pair {
        prefix: String,
        left: Option<ObjectId>,
        right: Option<ObjectId>,
    },
    /// A merge-join over two sorted entry lists, cursors included.
    Entries {
        prefix: String,
        left: Vec<NodeEntry>,
        right: Vec<NodeEntry>,
        li: usize,
        ri: usize,
    },
}

/// Iterator over the changes between two canonical trees.
pub struct TreeDiff<'a> {
    store: &'a dyn ObjectStore,
    stack: Vec<Frame>,
    failed: bool,
}

impl<'a> TreeDiff<'a> {
    fn new(store: &'a dyn ObjectStore, left: ObjectId, right: ObjectId) -> Self {
        let stack = if left == right {
            Vec::new()
        } else {
            vec![Frame::Pair {
                prefix: String::new(),
                left: Some(left),
                right: Some(right),
            }]
        };
        Self {
            store,
            stack,
            failed: false,
        }
    }

    fn load(&self, id: Option<ObjectId>) -> DiffResult<RevTree> {
        let Some(id) = id else {
            return Ok(RevTree::empty());
        };
        match self.store.get(&id)? {
            RevObject::Tree(tree) => Ok(tree),
            other => Err(DiffError::UnexpectedKind {
                id,
                expected: "tree",
                actual: other.kind().to_string(),
            }),
        }
    }

    /// Expand a subtree pair into follow-up frames.
    fn expand_pair(
        &mut self,
        prefix: String,
        left: Option<ObjectId>,
        right: Option<ObjectId>,
    ) -> DiffResult<()> {
        if left == right {
            return Ok(());
        }
        let left_tree = self.load(left)?;
        let right_tree = self.load(right)?;
        match (&left_tree.node, &right_tree.node) {
            (TreeNode::Leaf { entries: le }, TreeNode::Leaf { entries: re }) => {
                self.stack.push(Frame::Entries {
                    prefix,
                    left: le.clone(),
                    right: re.clone(),
                    li: 0,
                    ri: 0,
                });
            }
            (TreeNode::Buckets { buckets: lb }, TreeNode::Buckets { buckets: rb }) => {
                // Per-bucket recursion, with the same id short-circuit each
                // side of the fanout. Pushed in reverse so buckets pop in
                // ascending index order.
                for index in (0..BUCKET_COUNT as u8).rev() {
                    let l = lb.iter().find(|b| b.index == index).map(|b| b.tree_id);
                    let r = rb.iter().find(|b| b.index == index).map(|b| b.tree_id);
                    if l != r {
                        self.stack.push(Frame::Pair {
                            prefix: prefix.clone(),
                            left: l,
                            right: r,
                        });
                    }
                }
            }
            // Shapes disagree: one side sharded, the other inline. Expand
            // both to their logical ordered entry sets and merge-join.
            _ => {
                let le = self.logical_entries(left, &left_tree)?;
                let re = self.logical_entries(right, &right_tree)?;
                self.stack.push(Frame::Entries {
                    prefix,
                    left: le,
                    right: re,
                    li: 0,
                    ri: 0,
                });
            }
        }
        Ok(())
    }

    fn logical_entries(
        &self,
        id: Option<ObjectId>,
        tree: &RevTree,
    ) -> DiffResult<Vec<NodeEntry>> {
        match (&tree.node, id) {
            (TreeNode::Leaf { entries }, _) => Ok(entries.clone()),
            (TreeNode::Buckets { .. }, Some(id)) => {
                Ok(geovc_tree::collect_entries(self.store, &id)?)
            }
            // A bucketed node without an id cannot occur: None loads empty.
            (TreeNode::Buckets { .. }, None) => Ok(Vec::new()),
        }
    }

    /// Advance a merge-join far enough to produce one change.
    ///
    /// Returns `None` when the join either got exhausted or descended into
    /// a subtree pair (in which case the resumed join is back on the stack).
    fn advance_entries(
        &mut self,
        prefix: String,
        left: Vec<NodeEntry>,
        right: Vec<NodeEntry>,
        mut li: usize,
        mut ri: usize,
    ) -> Option<DiffEntry> {
        while li < left.len() || ri < right.len() {
            let order = match (left.get(li), right.get(ri)) {
                (Some(l), Some(r)) => l.name.cmp(&r.name),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => unreachable!("loop condition"),
            };
            match order {
                Ordering::Less => {
                    let old = left[li].clone();
                    li += 1;
                    let path = format!("{prefix}{}", old.name);
                    self.resume(prefix, left, right, li, ri);
                    if old.kind == EntryKind::Tree {
                        // A removed layer also reports its contents.
                        self.stack.push(Frame::Pair {
                            prefix: format!("{path}/"),
                            left: Some(old.object_id),
                            right: None,
                        });
                    }
                    return Some(DiffEntry::removed(path, old));
                }
                Ordering::Greater => {
                    let new = right[ri].clone();
                    ri += 1;
                    let path = format!("{prefix}{}", new.name);
                    self.resume(prefix, left, right, li, ri);
                    if new.kind == EntryKind::Tree {
                        // An added layer also reports its contents.
                        self.stack.push(Frame::Pair {
                            prefix: format!("{path}/"),
                            left: None,
                            right: Some(new.object_id),
                        });
                    }
                    return Some(DiffEntry::added(path, new));
                }
                Ordering::Equal => {
                    let old = left[li].clone();
                    let new = right[ri].clone();
                    li += 1;
                    ri += 1;
                    if old.object_id == new.object_id && old.metadata_id == new.metadata_id {
                        continue;
                    }
                    if old.kind == EntryKind::Tree
                        && new.kind == EntryKind::Tree
                        && old.object_id != new.object_id
                    {
                        // Descend into the subtree pair; the join resumes
                        // after the subtree is exhausted.
                        let sub_prefix = format!("{prefix}{}/", old.name);
                        let metadata_changed = old.metadata_id != new.metadata_id;
                        let pair = Frame::Pair {
                            prefix: sub_prefix,
                            left: Some(old.object_id),
                            right: Some(new.object_id),
                        };
                        let path = format!("{prefix}{}", old.name);
                        self.resume(prefix, left, right, li, ri);
                        self.stack.push(pair);
                        if metadata_changed {
                            // Surface the re-typed container itself too.
                            return Some(DiffEntry::modified(path, old, new));
                        }
                        return None;
                    }
                    let path = format!("{prefix}{}", old.name);
                    self.resume(prefix, left, right, li, ri);
                    return Some(DiffEntry::modified(path, old, new));
                }
            }
        }
        None
    }

    fn resume(
        &mut self,
        prefix: String,
        left: Vec<NodeEntry>,
        right: Vec<NodeEntry>,
        li: usize,
        ri: usize,
    ) {
        if li < left.len() || ri < right.len() {
            self.stack.push(Frame::Entries {
                prefix,
                left,
                right,
                li,
                ri,
            });
        }
    }
}

impl Iterator for TreeDiff<'_> {
    type Item = DiffResult<DiffEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let frame = self.stack.pop()?;
            match frame {
                Frame::Pair {
                    prefix,
                    left,
                    right,
                } => {
                    if let Err(e) = self.expand_pair(prefix, left, right) {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
                Frame::Entries {
                    prefix,
                    left,
                    right,
                    li,
                    ri,
                } => {
                    if let Some(entry) = self.advance_entries(prefix, left, right, li, ri) {
                        return Some(Ok(entry));
                    }
                }
            }
        }
    }
}
