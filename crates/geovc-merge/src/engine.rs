//! The three-way merge algorithm.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use geovc_diff::DiffEntry;
use geovc_graph::GraphDatabase;
use geovc_store::ObjectStore;
use geovc_types::{EntryKind, NodeEntry, ObjectId, RevCommit, RevObject, RevTree};

use crate::error::{MergeError, MergeResult};
use crate::outcome::{Conflict, MergeOutcome};

/// Three-way merge of two commits.
///
/// Resolves the merge base through the commit graph, then delegates to
/// [`merge_trees`]. Fast paths: merging a commit with itself, or with one of
/// its own ancestors or descendants, returns the appropriate existing tree
/// without diffing anything. Two commits with no common ancestor fail with
/// [`MergeError::NoMergeBase`].
///
/// With several merge-base candidates (criss-cross history) the most recent
/// one by topological order is used as a virtual base. That keeps the merge
/// deterministic; it can surface conflicts an optimal recursive base would
/// have avoided.
pub fn merge(
    store: &dyn ObjectStore,
    graph: &dyn GraphDatabase,
    ours: &ObjectId,
    theirs: &ObjectId,
) -> MergeResult<MergeOutcome> {
    if ours == theirs {
        let tree_id = load_commit(store, ours)?.tree_id;
        return Ok(MergeOutcome::Merged { tree_id });
    }

    let bases = graph.merge_base(ours, theirs)?;
    let base = match bases.as_slice() {
        [] => {
            return Err(MergeError::NoMergeBase {
                ours: *ours,
                theirs: *theirs,
            })
        }
        [single] => *single,
        several => graph.topo_order(several)?[0],
    };

    if base == *ours {
        // Ours is an ancestor of theirs: fast-forward.
        let tree_id = load_commit(store, theirs)?.tree_id;
        return Ok(MergeOutcome::Merged { tree_id });
    }
    if base == *theirs {
        let tree_id = load_commit(store, ours)?.tree_id;
        return Ok(MergeOutcome::Merged { tree_id });
    }

    debug!(ours = %ours.short_hex(), theirs = %theirs.short_hex(), base = %base.short_hex(), "three-way merge");

    let base_tree = load_commit(store, &base)?.tree_id;
    let ours_tree = load_commit(store, ours)?.tree_id;
    let theirs_tree = load_commit(store, theirs)?.tree_id;
    merge_trees(store, &base_tree, &ours_tree, &theirs_tree)
}

/// Three-way merge of two trees against a common base tree.
///
/// Both sides are diffed against the base and the two change sets are
/// merge-joined by path: a path changed on one side applies directly, the
/// same change on both sides applies once, and diverging changes (different
/// new ids, or a delete against a modify) become a [`Conflict`]. Layer
/// containers changed on both sides are the exception: their contents join
/// feature by feature under the layer prefix, and only the schema pointer
/// is reconciled at the container itself. Only when the conflict set is
/// empty are the resolved changes applied to the base tree.
pub fn merge_trees(
    store: &dyn ObjectStore,
    base: &ObjectId,
    ours: &ObjectId,
    theirs: &ObjectId,
) -> MergeResult<MergeOutcome> {
    if ours == theirs || base == theirs {
        return Ok(MergeOutcome::Merged { tree_id: *ours });
    }
    if base == ours {
        return Ok(MergeOutcome::Merged { tree_id: *theirs });
    }

    let ours_changes = collect_changes(store, base, ours)?;
    let theirs_changes = collect_changes(store, base, theirs)?;

    let mut resolved: Vec<DiffEntry> = Vec::new();
    let mut conflicts: Vec<Conflict> = Vec::new();
    // Layer path -> schema pointer the rebuilt container must carry.
    let mut schema_overrides: BTreeMap<String, Option<ObjectId>> = BTreeMap::new();

    let paths: BTreeSet<&String> = ours_changes.keys().chain(theirs_changes.keys()).collect();
    for path in paths {
        match (ours_changes.get(path), theirs_changes.get(path)) {
            (Some(o), None) => resolved.push(o.clone()),
            (None, Some(t)) => resolved.push(t.clone()),
            (Some(o), Some(t)) => {
                if o.new == t.new {
                    resolved.push(o.clone());
                    continue;
                }
                if is_container_content_change(o) && is_container_content_change(t) {
                    // Both sides reshaped the same layer. Its contents join
                    // at the feature level under the layer prefix; only the
                    // schema pointer needs reconciling here.
                    let base_meta = o.old.as_ref().and_then(|e| e.metadata_id);
                    let o_meta = o.new.as_ref().and_then(|e| e.metadata_id);
                    let t_meta = t.new.as_ref().and_then(|e| e.metadata_id);
                    let o_retyped = o.new.is_some() && o_meta != base_meta;
                    let t_retyped = t.new.is_some() && t_meta != base_meta;
                    match (o_retyped, t_retyped) {
                        (true, true) if o_meta != t_meta => conflicts.push(Conflict {
                            path: path.clone(),
                            base_id: o.old_id().or(t.old_id()),
                            ours_id: o.new_id(),
                            theirs_id: t.new_id(),
                        }),
                        (true, _) => {
                            schema_overrides.insert(path.clone(), o_meta);
                        }
                        (_, true) => {
                            schema_overrides.insert(path.clone(), t_meta);
                        }
                        (false, false) => {}
                    }
                    continue;
                }
                conflicts.push(Conflict {
                    path: path.clone(),
                    base_id: o.old_id().or(t.old_id()),
                    ours_id: o.new_id(),
                    theirs_id: t.new_id(),
                });
            }
            (None, None) => unreachable!("path came from one of the maps"),
        }
    }

    if !conflicts.is_empty() {
        // BTreeSet iteration already sorted these by path.
        return Ok(MergeOutcome::Conflicts(conflicts));
    }

    let mut tree_id = *base;
    for change in &resolved {
        tree_id = apply_at(
            store,
            &tree_id,
            &change.path,
            change.new.as_ref(),
            "",
            &schema_overrides,
        )?;
    }
    Ok(MergeOutcome::Merged { tree_id })
}

/// Collect one side's changes against the base, keyed by path.
fn collect_changes(
    store: &dyn ObjectStore,
    base: &ObjectId,
    side: &ObjectId,
) -> MergeResult<BTreeMap<String, DiffEntry>> {
    let mut changes = BTreeMap::new();
    for item in geovc_diff::diff(store, base, side) {
        let entry = item?;
        changes.insert(entry.path.clone(), entry);
    }
    Ok(changes)
}

/// A layer whose own tree id changed, described entry-by-entry by its
/// children in the same change set.
///
/// An absent side counts as tree-shaped so one-sided layers qualify; a kind
/// change (feature on one side, layer on the other) does not, since no child
/// entries describe it.
fn is_container_content_change(entry: &DiffEntry) -> bool {
    let tree_or_absent = |side: &Option<NodeEntry>| {
        side.as_ref().map_or(true, |e| e.kind == EntryKind::Tree)
    };
    tree_or_absent(&entry.old) && tree_or_absent(&entry.new) && entry.old_id() != entry.new_id()
}

/// Apply one resolved change at a (possibly nested) path.
///
/// `new` is the entry on the winning side, `None` for a deletion. Missing
/// intermediate layers are created; a layer left empty by a deletion is
/// dropped from its parent. A rebuilt container takes its schema pointer
/// from `schema_overrides` when the join recorded one for it, otherwise
/// from the tree being applied onto.
fn apply_at(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    path: &str,
    new: Option<&NodeEntry>,
    prefix: &str,
    schema_overrides: &BTreeMap<String, Option<ObjectId>>,
) -> MergeResult<ObjectId> {
    let Some((layer, rest)) = path.split_once('/') else {
        return match new {
            Some(entry) => Ok(geovc_tree::insert(store, tree_id, entry.clone())?),
            None => Ok(geovc_tree::remove(store, tree_id, path)?),
        };
    };

    let layer_path = format!("{prefix}{layer}");
    let existing = geovc_tree::get(store, tree_id, layer)?;
    let child_id = match &existing {
        Some(e) => e.object_id,
        None => geovc_tree::put_empty(store)?,
    };
    let child_prefix = format!("{layer_path}/");
    let new_child_id = apply_at(store, &child_id, rest, new, &child_prefix, schema_overrides)?;
    let child_tree = load_tree(store, &new_child_id)?;

    if child_tree.is_empty() {
        return Ok(geovc_tree::remove(store, tree_id, layer)?);
    }
    let mut entry = NodeEntry::subtree(layer, new_child_id);
    entry.metadata_id = match schema_overrides.get(&layer_path) {
        Some(meta) => *meta,
        None => existing.as_ref().and_then(|e| e.metadata_id),
    };
    entry.extent = child_tree.extent;
    Ok(geovc_tree::insert(store, tree_id, entry)?)
}

fn load_commit(store: &dyn ObjectStore, id: &ObjectId) -> MergeResult<RevCommit> {
    match store.get(id)? {
        RevObject::Commit(c) => Ok(c),
        other => Err(MergeError::UnexpectedKind {
            id: *id,
            expected: "commit",
            actual: other.kind().to_string(),
        }),
    }
}

fn load_tree(store: &dyn ObjectStore, id: &ObjectId) -> MergeResult<RevTree> {
    match store.get(id)? {
        RevObject::Tree(t) => Ok(t),
        other => Err(MergeError::UnexpectedKind {
            id: *id,
            expected: "tree",
            actual: other.kind().to_string(),
        }),
    }
}
