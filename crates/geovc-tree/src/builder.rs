//! Construction and copy-on-write editing of canonical trees.
//!
//! Everything funnels through [`build_at`], which decides leaf-vs-sharded
//! purely from the entry count at the current depth. Insert and remove only
//! rebuild the root-to-leaf path they touch and re-summarize the parents,
//! so sibling buckets keep their ids.

use std::collections::BTreeMap;

use geovc_store::ObjectStore;
use geovc_types::{Bucket, Envelope, NodeEntry, ObjectId, RevObject, RevTree, TreeNode};
use tracing::debug;

use crate::error::{TreeError, TreeResult};
use crate::layout::{bucket_index, LEAF_THRESHOLD, MAX_DEPTH};

/// Store the empty tree and return its id.
pub fn put_empty(store: &dyn ObjectStore) -> TreeResult<ObjectId> {
    Ok(store.put(&RevObject::Tree(RevTree::empty()))?)
}

/// Build the canonical tree for an entry set and return its id.
///
/// The result depends only on the set of entries: any insertion order, and
/// any interleaving of `insert`/`remove` calls arriving at the same set,
/// produces the same id. Duplicate names keep the last occurrence.
pub fn build(store: &dyn ObjectStore, entries: Vec<NodeEntry>) -> TreeResult<ObjectId> {
    build_at(store, entries, 0)
}

fn build_at(store: &dyn ObjectStore, entries: Vec<NodeEntry>, depth: usize) -> TreeResult<ObjectId> {
    let mut by_name: BTreeMap<String, NodeEntry> = BTreeMap::new();
    for entry in entries {
        by_name.insert(entry.name.clone(), entry);
    }
    if by_name.len() <= LEAF_THRESHOLD || depth >= MAX_DEPTH {
        return put_leaf(store, by_name.into_values().collect());
    }

    let total = by_name.len() as u64;
    let mut partitions: BTreeMap<u8, Vec<NodeEntry>> = BTreeMap::new();
    let mut extent = Envelope::null();
    for entry in by_name.into_values() {
        if let Some(e) = &entry.extent {
            extent.expand_to_include(e);
        }
        partitions
            .entry(bucket_index(&entry.name, depth))
            .or_default()
            .push(entry);
    }

    let mut buckets = Vec::with_capacity(partitions.len());
    for (index, bucket_entries) in partitions {
        let tree_id = build_at(store, bucket_entries, depth + 1)?;
        buckets.push(Bucket::new(index, tree_id));
    }
    debug!(size = total, depth, buckets = buckets.len(), "sharded tree node");

    let tree = RevTree {
        size: total,
        extent: if extent.is_null() { None } else { Some(extent) },
        node: TreeNode::Buckets { buckets },
    };
    Ok(store.put(&RevObject::Tree(tree))?)
}

fn put_leaf(store: &dyn ObjectStore, entries: Vec<NodeEntry>) -> TreeResult<ObjectId> {
    let mut extent = Envelope::null();
    for entry in &entries {
        if let Some(e) = &entry.extent {
            extent.expand_to_include(e);
        }
    }
    let tree = RevTree {
        size: entries.len() as u64,
        extent: if extent.is_null() { None } else { Some(extent) },
        node: TreeNode::Leaf { entries },
    };
    Ok(store.put(&RevObject::Tree(tree))?)
}

fn load_tree(store: &dyn ObjectStore, id: &ObjectId) -> TreeResult<RevTree> {
    match store.get(id)? {
        RevObject::Tree(tree) => Ok(tree),
        other => Err(TreeError::NotATree {
            id: *id,
            actual: other.kind().to_string(),
        }),
    }
}

/// Look up an entry by name, descending bucket-by-bucket.
///
/// O(depth) store reads; depth is logarithmic in the entry count.
pub fn get(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    name: &str,
) -> TreeResult<Option<NodeEntry>> {
    let mut current = *tree_id;
    let mut depth = 0;
    loop {
        let tree = load_tree(store, &current)?;
        match tree.node {
            TreeNode::Leaf { entries } => {
                return Ok(entries
                    .binary_search_by(|e| e.name.as_str().cmp(name))
                    .ok()
                    .map(|i| entries[i].clone()));
            }
            TreeNode::Buckets { buckets } => {
                let index = bucket_index(name, depth);
                match buckets.iter().find(|b| b.index == index) {
                    Some(bucket) => {
                        current = bucket.tree_id;
                        depth += 1;
                    }
                    None => return Ok(None),
                }
            }
        }
    }
}

/// Insert (or replace) an entry, returning the id of the new tree.
///
/// Copy-on-write: only the nodes on the path to the touched leaf change id.
pub fn insert(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    entry: NodeEntry,
) -> TreeResult<ObjectId> {
    insert_at(store, tree_id, entry, 0)
}

fn insert_at(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    entry: NodeEntry,
    depth: usize,
) -> TreeResult<ObjectId> {
    let tree = load_tree(store, tree_id)?;
    match tree.node {
        TreeNode::Leaf { entries } => {
            let mut all = entries;
            all.push(entry);
            // build_at re-sorts, dedupes on name (last wins), and decides
            // whether the grown leaf must shard.
            build_at(store, all, depth)
        }
        TreeNode::Buckets { buckets } => {
            let index = bucket_index(&entry.name, depth);
            let mut buckets = buckets;
            match buckets.iter().position(|b| b.index == index) {
                Some(pos) => {
                    buckets[pos].tree_id =
                        insert_at(store, &buckets[pos].tree_id, entry, depth + 1)?;
                }
                None => {
                    let child = build_at(store, vec![entry], depth + 1)?;
                    let at = buckets.partition_point(|b| b.index < index);
                    buckets.insert(at, Bucket::new(index, child));
                }
            }
            summarize_buckets(store, buckets, depth)
        }
    }
}

/// Remove an entry by name, returning the id of the new tree.
///
/// Removing a name that is not present returns the original id unchanged.
pub fn remove(store: &dyn ObjectStore, tree_id: &ObjectId, name: &str) -> TreeResult<ObjectId> {
    remove_at(store, tree_id, name, 0)
}

fn remove_at(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    name: &str,
    depth: usize,
) -> TreeResult<ObjectId> {
    let tree = load_tree(store, tree_id)?;
    match tree.node {
        TreeNode::Leaf { entries } => {
            let before = entries.len();
            let remaining: Vec<NodeEntry> =
                entries.into_iter().filter(|e| e.name != name).collect();
            if remaining.len() == before {
                return Ok(*tree_id);
            }
            build_at(store, remaining, depth)
        }
        TreeNode::Buckets { buckets } => {
            let index = bucket_index(name, depth);
            let mut buckets = buckets;
            let Some(pos) = buckets.iter().position(|b| b.index == index) else {
                return Ok(*tree_id);
            };
            let old_child = buckets[pos].tree_id;
            let new_child = remove_at(store, &old_child, name, depth + 1)?;
            if new_child == old_child {
                return Ok(*tree_id);
            }
            if load_tree(store, &new_child)?.is_empty() {
                // The last entry of this bucket went away; the bucket goes too.
                buckets.remove(pos);
            } else {
                buckets[pos].tree_id = new_child;
            }
            if buckets.is_empty() {
                return put_empty(store);
            }
            summarize_buckets(store, buckets, depth)
        }
    }
}

/// Recompute a sharded node's summary after a bucket changed, re-flattening
/// into a leaf when the subtree shrank back under the threshold.
fn summarize_buckets(
    store: &dyn ObjectStore,
    buckets: Vec<Bucket>,
    depth: usize,
) -> TreeResult<ObjectId> {
    let mut size = 0u64;
    let mut extent = Envelope::null();
    for bucket in &buckets {
        let child = load_tree(store, &bucket.tree_id)?;
        size += child.size;
        if let Some(e) = &child.extent {
            extent.expand_to_include(e);
        }
    }

    if size as usize <= LEAF_THRESHOLD {
        // Shrunk below the sharding threshold: the canonical shape for this
        // entry set is a leaf, so the shape invariant forces a re-flatten.
        let mut entries = Vec::with_capacity(size as usize);
        for bucket in &buckets {
            collect_into(store, &bucket.tree_id, &mut entries)?;
        }
        return build_at(store, entries, depth);
    }

    let tree = RevTree {
        size,
        extent: if extent.is_null() { None } else { Some(extent) },
        node: TreeNode::Buckets { buckets },
    };
    Ok(store.put(&RevObject::Tree(tree))?)
}

/// All leaf entries of a subtree, sorted by name.
///
/// Materializes the subtree; meant for small trees, re-flattening, and the
/// diff engine's mixed-shape expansion, not for streaming enormous datasets.
pub fn collect_entries(store: &dyn ObjectStore, tree_id: &ObjectId) -> TreeResult<Vec<NodeEntry>> {
    let mut entries = Vec::new();
    collect_into(store, tree_id, &mut entries)?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn collect_into(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    out: &mut Vec<NodeEntry>,
) -> TreeResult<()> {
    let tree = load_tree(store, tree_id)?;
    match tree.node {
        TreeNode::Leaf { entries } => out.extend(entries),
        TreeNode::Buckets { buckets } => {
            for bucket in buckets {
                collect_into(store, &bucket.tree_id, out)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geovc_store::HeapObjectStore;
    use geovc_types::EntryKind;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    fn entry(name: &str) -> NodeEntry {
        NodeEntry::feature(name, ObjectId::from_bytes(name.as_bytes()))
    }

    fn entries(n: usize) -> Vec<NodeEntry> {
        (0..n).map(|i| entry(&format!("feature-{i}"))).collect()
    }

    fn root(store: &HeapObjectStore, id: &ObjectId) -> RevTree {
        load_tree(store, id).unwrap()
    }

    #[test]
    fn empty_build_equals_put_empty() {
        let store = HeapObjectStore::new();
        let built = build(&store, vec![]).unwrap();
        let empty = put_empty(&store).unwrap();
        assert_eq!(built, empty);
        assert!(root(&store, &built).is_empty());
    }

    #[test]
    fn threshold_entries_stay_a_leaf() {
        let store = HeapObjectStore::new();
        let id = build(&store, entries(LEAF_THRESHOLD)).unwrap();
        let tree = root(&store, &id);
        assert!(tree.is_leaf());
        assert_eq!(tree.size, LEAF_THRESHOLD as u64);
    }

    #[test]
    fn threshold_plus_one_shards() {
        let store = HeapObjectStore::new();
        let id = build(&store, entries(LEAF_THRESHOLD + 1)).unwrap();
        let tree = root(&store, &id);
        assert!(!tree.is_leaf());
        assert_eq!(tree.size, LEAF_THRESHOLD as u64 + 1);
    }

    #[test]
    fn build_is_order_independent_reversed() {
        let store = HeapObjectStore::new();
        let forward = build(&store, entries(100)).unwrap();
        let mut reversed = entries(100);
        reversed.reverse();
        let backward = build(&store, reversed).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn duplicate_names_keep_last() {
        let store = HeapObjectStore::new();
        let a = NodeEntry::feature("dup", oid(1));
        let b = NodeEntry::feature("dup", oid(2));
        let id = build(&store, vec![a, b]).unwrap();
        let found = get(&store, &id, "dup").unwrap().unwrap();
        assert_eq!(found.object_id, oid(2));
        assert_eq!(root(&store, &id).size, 1);
    }

    #[test]
    fn get_finds_every_entry_in_sharded_tree() {
        let store = HeapObjectStore::new();
        let id = build(&store, entries(200)).unwrap();
        for i in 0..200 {
            let name = format!("feature-{i}");
            let found = get(&store, &id, &name).unwrap().expect("entry present");
            assert_eq!(found.name, name);
        }
        assert!(get(&store, &id, "feature-200").unwrap().is_none());
    }

    #[test]
    fn incremental_inserts_match_bulk_build() {
        let store = HeapObjectStore::new();
        let bulk = build(&store, entries(100)).unwrap();

        let mut id = put_empty(&store).unwrap();
        for e in entries(100) {
            id = insert(&store, &id, e).unwrap();
        }
        assert_eq!(id, bulk);
    }

    #[test]
    fn insert_replaces_existing_name() {
        let store = HeapObjectStore::new();
        let id = build(&store, entries(10)).unwrap();
        let id = insert(&store, &id, NodeEntry::feature("feature-3", oid(0xaa))).unwrap();
        assert_eq!(
            get(&store, &id, "feature-3").unwrap().unwrap().object_id,
            oid(0xaa)
        );
        assert_eq!(root(&store, &id).size, 10);
    }

    #[test]
    fn remove_missing_returns_same_id() {
        let store = HeapObjectStore::new();
        let id = build(&store, entries(50)).unwrap();
        let same = remove(&store, &id, "not-there").unwrap();
        assert_eq!(id, same);
    }

    #[test]
    fn removals_match_bulk_build_of_remainder() {
        let store = HeapObjectStore::new();
        let mut id = build(&store, entries(40)).unwrap();
        for i in 30..40 {
            id = remove(&store, &id, &format!("feature-{i}")).unwrap();
        }
        // 30 entries is back under the threshold, so this also exercises
        // the re-flatten into a leaf.
        let fresh = build(&store, entries(30)).unwrap();
        assert_eq!(id, fresh);
        assert!(root(&store, &id).is_leaf());
    }

    #[test]
    fn remove_last_entry_yields_empty_tree() {
        let store = HeapObjectStore::new();
        let mut id = build(&store, entries(3)).unwrap();
        for i in 0..3 {
            id = remove(&store, &id, &format!("feature-{i}")).unwrap();
        }
        assert_eq!(id, put_empty(&store).unwrap());
    }

    #[test]
    fn insert_shares_untouched_buckets() {
        let store = HeapObjectStore::new();
        let before = build(&store, entries(200)).unwrap();
        let after = insert(&store, &before, entry("brand-new")).unwrap();

        let old_buckets = root(&store, &before).buckets().unwrap().to_vec();
        let new_buckets = root(&store, &after).buckets().unwrap().to_vec();

        let changed = new_buckets
            .iter()
            .filter(|b| !old_buckets.contains(b))
            .count();
        assert_eq!(changed, 1, "exactly one bucket on the path should change");
    }

    #[test]
    fn size_counts_whole_subtree() {
        let store = HeapObjectStore::new();
        let id = build(&store, entries(500)).unwrap();
        assert_eq!(root(&store, &id).size, 500);
    }

    #[test]
    fn extent_is_union_of_entry_extents() {
        let store = HeapObjectStore::new();
        let id = build(
            &store,
            vec![
                entry("plain"),
                NodeEntry::feature("west", oid(1)).with_extent(Envelope::point(-10.0, 0.0)),
                NodeEntry::feature("east", oid(2)).with_extent(Envelope::point(10.0, 5.0)),
            ],
        )
        .unwrap();
        assert_eq!(
            root(&store, &id).extent,
            Some(Envelope::new(-10.0, 0.0, 10.0, 5.0))
        );
    }

    #[test]
    fn extent_survives_sharding() {
        let store = HeapObjectStore::new();
        let all: Vec<NodeEntry> = (0..100)
            .map(|i| {
                NodeEntry::feature(format!("f{i}"), oid(1))
                    .with_extent(Envelope::point(i as f64, 0.0))
            })
            .collect();
        let id = build(&store, all).unwrap();
        assert_eq!(
            root(&store, &id).extent,
            Some(Envelope::new(0.0, 0.0, 99.0, 0.0))
        );
    }

    #[test]
    fn collect_entries_is_sorted_and_complete() {
        let store = HeapObjectStore::new();
        let id = build(&store, entries(150)).unwrap();
        let collected = collect_entries(&store, &id).unwrap();
        assert_eq!(collected.len(), 150);
        assert!(collected.windows(2).all(|w| w[0].name < w[1].name));
    }

    #[test]
    fn subtree_entries_keep_their_kind() {
        let store = HeapObjectStore::new();
        let layer = NodeEntry::new("roads", oid(7), EntryKind::Tree).with_metadata(oid(8));
        let id = build(&store, vec![layer.clone()]).unwrap();
        assert_eq!(get(&store, &id, "roads").unwrap(), Some(layer));
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]

        #[test]
        fn build_is_insertion_order_independent(seed in proptest::collection::vec(0u64..1000, 1..300)) {
            let store = HeapObjectStore::new();
            let names: std::collections::BTreeSet<u64> = seed.iter().copied().collect();
            let canonical: Vec<NodeEntry> = names
                .iter()
                .map(|n| entry(&format!("feature-{n}")))
                .collect();
            let shuffled: Vec<NodeEntry> = seed
                .iter()
                .map(|n| entry(&format!("feature-{n}")))
                .collect();
            let a = build(&store, canonical).unwrap();
            let b = build(&store, shuffled).unwrap();
            proptest::prop_assert_eq!(a, b);
        }
    }
}
