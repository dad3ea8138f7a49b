use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use geovc_types::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::traits::GraphDatabase;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct NodeRecord {
    parents: Vec<ObjectId>,
    children: Vec<ObjectId>,
    timestamp_ms: i64,
}

/// In-memory commit graph backend.
///
/// The node and edge index sits behind a single `RwLock`: `put` takes the
/// write lock for validation and mutation as one unit, so a query issued
/// after `put` returns always observes the new edges. Readers share the
/// lock and never block each other.
#[derive(Default)]
pub struct HeapGraphDatabase {
    nodes: RwLock<HashMap<ObjectId, NodeRecord>>,
}

impl HeapGraphDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commits recorded.
    pub fn len(&self) -> usize {
        self.nodes.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().expect("lock poisoned").is_empty()
    }
}

/// Reachability by parent edges inside the locked index.
fn reaches(nodes: &HashMap<ObjectId, NodeRecord>, from: &[ObjectId], target: &ObjectId) -> bool {
    let mut queue: VecDeque<ObjectId> = from.iter().copied().collect();
    let mut visited: HashSet<ObjectId> = queue.iter().copied().collect();
    while let Some(current) = queue.pop_front() {
        if current == *target {
            return true;
        }
        if let Some(record) = nodes.get(&current) {
            for parent in &record.parents {
                if visited.insert(*parent) {
                    queue.push_back(*parent);
                }
            }
        }
    }
    false
}

impl GraphDatabase for HeapGraphDatabase {
    fn put(
        &self,
        commit_id: ObjectId,
        parent_ids: &[ObjectId],
        timestamp_ms: i64,
    ) -> GraphResult<bool> {
        let mut nodes = self.nodes.write().expect("lock poisoned");

        if let Some(existing) = nodes.get(&commit_id) {
            if existing.parents == parent_ids && existing.timestamp_ms == timestamp_ms {
                return Ok(false);
            }
        }

        for parent in parent_ids {
            if !nodes.contains_key(parent) {
                return Err(GraphError::MissingParent {
                    commit: commit_id,
                    parent: *parent,
                });
            }
        }

        // Re-mapping an existing commit could close a loop; a brand-new id
        // cannot, but the check is cheap relative to the damage.
        if reaches(&nodes, parent_ids, &commit_id) {
            return Err(GraphError::CyclicGraph(commit_id));
        }

        let mut children = Vec::new();
        if let Some(old) = nodes.remove(&commit_id) {
            children = old.children;
            for parent in &old.parents {
                if let Some(record) = nodes.get_mut(parent) {
                    record.children.retain(|c| c != &commit_id);
                }
            }
        }
        for parent in parent_ids {
            let record = nodes.get_mut(parent).expect("parent checked above");
            record.children.push(commit_id);
        }
        nodes.insert(
            commit_id,
            NodeRecord {
                parents: parent_ids.to_vec(),
                children,
                timestamp_ms,
            },
        );
        debug!(
            commit = %commit_id.short_hex(),
            parents = parent_ids.len(),
            "recorded commit edges"
        );
        Ok(true)
    }

    fn contains(&self, id: &ObjectId) -> GraphResult<bool> {
        Ok(self.nodes.read().expect("lock poisoned").contains_key(id))
    }

    fn parents(&self, id: &ObjectId) -> GraphResult<Vec<ObjectId>> {
        let nodes = self.nodes.read().expect("lock poisoned");
        nodes
            .get(id)
            .map(|r| r.parents.clone())
            .ok_or(GraphError::NotFound(*id))
    }

    fn children(&self, id: &ObjectId) -> GraphResult<Vec<ObjectId>> {
        let nodes = self.nodes.read().expect("lock poisoned");
        nodes
            .get(id)
            .map(|r| r.children.clone())
            .ok_or(GraphError::NotFound(*id))
    }

    fn timestamp(&self, id: &ObjectId) -> GraphResult<i64> {
        let nodes = self.nodes.read().expect("lock poisoned");
        nodes
            .get(id)
            .map(|r| r.timestamp_ms)
            .ok_or(GraphError::NotFound(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    /// Linear chain oid(1) <- oid(2) <- ... <- oid(n), timestamps ascending.
    fn chain(n: u8) -> HeapGraphDatabase {
        let graph = HeapGraphDatabase::new();
        graph.put(oid(1), &[], 1000).unwrap();
        for i in 2..=n {
            graph.put(oid(i), &[oid(i - 1)], 1000 + i as i64).unwrap();
        }
        graph
    }

    #[test]
    fn put_and_lookup_edges() {
        let graph = chain(3);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.parents(&oid(1)).unwrap(), vec![]);
        assert_eq!(graph.parents(&oid(3)).unwrap(), vec![oid(2)]);
        assert_eq!(graph.children(&oid(1)).unwrap(), vec![oid(2)]);
        assert_eq!(graph.children(&oid(3)).unwrap(), vec![]);
        assert_eq!(graph.timestamp(&oid(2)).unwrap(), 1002);
    }

    #[test]
    fn put_is_idempotent() {
        let graph = chain(2);
        assert!(!graph.put(oid(2), &[oid(1)], 1002).unwrap());
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.children(&oid(1)).unwrap(), vec![oid(2)]);
    }

    #[test]
    fn reput_with_new_timestamp_updates_it() {
        let graph = chain(2);
        assert!(graph.put(oid(2), &[oid(1)], 9999).unwrap());
        assert_eq!(graph.timestamp(&oid(2)).unwrap(), 9999);
        assert_eq!(graph.children(&oid(1)).unwrap(), vec![oid(2)]);
    }

    #[test]
    fn missing_parent_is_rejected() {
        let graph = HeapGraphDatabase::new();
        let err = graph.put(oid(1), &[oid(9)], 0).unwrap_err();
        assert!(matches!(err, GraphError::MissingParent { .. }));
    }

    #[test]
    fn remap_creating_cycle_is_rejected() {
        let graph = chain(3);
        // Re-mapping the root under its own descendant closes a loop.
        let err = graph.put(oid(1), &[oid(3)], 1001).unwrap_err();
        assert!(matches!(err, GraphError::CyclicGraph(id) if id == oid(1)));
        // Graph unchanged.
        assert_eq!(graph.parents(&oid(1)).unwrap(), vec![]);
    }

    #[test]
    fn remap_to_new_parents_relinks_children() {
        let graph = HeapGraphDatabase::new();
        graph.put(oid(1), &[], 0).unwrap();
        graph.put(oid(2), &[], 0).unwrap();
        graph.put(oid(3), &[oid(1)], 1).unwrap();
        graph.put(oid(3), &[oid(2)], 1).unwrap();
        assert_eq!(graph.children(&oid(1)).unwrap(), vec![]);
        assert_eq!(graph.children(&oid(2)).unwrap(), vec![oid(3)]);
        assert_eq!(graph.parents(&oid(3)).unwrap(), vec![oid(2)]);
    }

    #[test]
    fn unknown_lookups_are_not_found() {
        let graph = HeapGraphDatabase::new();
        assert!(!graph.contains(&oid(9)).unwrap());
        assert!(matches!(
            graph.parents(&oid(9)),
            Err(GraphError::NotFound(_))
        ));
        assert!(matches!(
            graph.timestamp(&oid(9)),
            Err(GraphError::NotFound(_))
        ));
    }

    #[test]
    fn is_ancestor_follows_parent_edges() {
        let graph = chain(4);
        assert!(graph.is_ancestor(&oid(1), &oid(4)).unwrap());
        assert!(graph.is_ancestor(&oid(3), &oid(4)).unwrap());
        assert!(!graph.is_ancestor(&oid(4), &oid(1)).unwrap());
        assert!(graph.is_ancestor(&oid(2), &oid(2)).unwrap());
        assert!(!graph.is_ancestor(&oid(9), &oid(1)).unwrap());
    }

    #[test]
    fn depth_is_distance_to_root() {
        let graph = chain(5);
        assert_eq!(graph.depth(&oid(1)).unwrap(), 0);
        assert_eq!(graph.depth(&oid(5)).unwrap(), 4);
    }

    #[test]
    fn depth_of_merge_takes_shortest_path() {
        // 1 <- 2 <- 3 <- 5, 1 <- 4 <- 5: depth(5) via 4 is 2.
        let graph = HeapGraphDatabase::new();
        graph.put(oid(1), &[], 0).unwrap();
        graph.put(oid(2), &[oid(1)], 1).unwrap();
        graph.put(oid(3), &[oid(2)], 2).unwrap();
        graph.put(oid(4), &[oid(1)], 3).unwrap();
        graph.put(oid(5), &[oid(3), oid(4)], 4).unwrap();
        assert_eq!(graph.depth(&oid(5)).unwrap(), 2);
    }

    #[test]
    fn merge_base_of_simple_branches() {
        // A=1; B=2 and D=3 branch off A; C=4 merges them.
        let graph = HeapGraphDatabase::new();
        graph.put(oid(1), &[], 0).unwrap();
        graph.put(oid(2), &[oid(1)], 1).unwrap();
        graph.put(oid(3), &[oid(1)], 2).unwrap();
        graph.put(oid(4), &[oid(2), oid(3)], 3).unwrap();

        assert_eq!(graph.merge_base(&oid(2), &oid(3)).unwrap(), vec![oid(1)]);
        // A commit merged into both sides is its own base.
        assert_eq!(graph.merge_base(&oid(4), &oid(4)).unwrap(), vec![oid(4)]);
    }

    #[test]
    fn merge_base_when_one_side_is_ancestor() {
        let graph = chain(4);
        assert_eq!(graph.merge_base(&oid(2), &oid(4)).unwrap(), vec![oid(2)]);
        assert_eq!(graph.merge_base(&oid(4), &oid(2)).unwrap(), vec![oid(2)]);
    }

    #[test]
    fn merge_base_discards_non_maximal_ancestors() {
        // 1 <- 2 <- 3 and 1 <- 2 <- 4: base of (3,4) is 2, never 1.
        let graph = HeapGraphDatabase::new();
        graph.put(oid(1), &[], 0).unwrap();
        graph.put(oid(2), &[oid(1)], 1).unwrap();
        graph.put(oid(3), &[oid(2)], 2).unwrap();
        graph.put(oid(4), &[oid(2)], 3).unwrap();
        assert_eq!(graph.merge_base(&oid(3), &oid(4)).unwrap(), vec![oid(2)]);
    }

    #[test]
    fn criss_cross_returns_both_bases() {
        // B=2 and C=3 branch off A=1; X=4 and Y=5 each merge both.
        let graph = HeapGraphDatabase::new();
        graph.put(oid(1), &[], 0).unwrap();
        graph.put(oid(2), &[oid(1)], 1).unwrap();
        graph.put(oid(3), &[oid(1)], 2).unwrap();
        graph.put(oid(4), &[oid(2), oid(3)], 3).unwrap();
        graph.put(oid(5), &[oid(2), oid(3)], 4).unwrap();

        let bases = graph.merge_base(&oid(4), &oid(5)).unwrap();
        assert_eq!(bases.len(), 2);
        assert!(bases.contains(&oid(2)));
        assert!(bases.contains(&oid(3)));
    }

    #[test]
    fn disconnected_commits_have_no_base() {
        let graph = HeapGraphDatabase::new();
        graph.put(oid(1), &[], 0).unwrap();
        graph.put(oid(2), &[], 1).unwrap();
        assert!(graph.merge_base(&oid(1), &oid(2)).unwrap().is_empty());
    }

    #[test]
    fn topo_order_puts_descendants_first() {
        let graph = chain(4);
        let order = graph
            .topo_order(&[oid(1), oid(3), oid(4), oid(2)])
            .unwrap();
        assert_eq!(order, vec![oid(4), oid(3), oid(2), oid(1)]);
    }

    #[test]
    fn topo_order_breaks_ties_by_timestamp_desc() {
        // Two unrelated roots: newer first.
        let graph = HeapGraphDatabase::new();
        graph.put(oid(1), &[], 100).unwrap();
        graph.put(oid(2), &[], 200).unwrap();
        let order = graph.topo_order(&[oid(1), oid(2)]).unwrap();
        assert_eq!(order, vec![oid(2), oid(1)]);
    }

    #[test]
    fn topo_order_rejects_unknown_ids() {
        let graph = chain(2);
        assert!(matches!(
            graph.topo_order(&[oid(1), oid(9)]),
            Err(GraphError::NotFound(_))
        ));
    }

    #[test]
    fn put_is_visible_to_queries_immediately() {
        use std::sync::Arc;
        use std::thread;

        let graph = Arc::new(HeapGraphDatabase::new());
        graph.put(oid(1), &[], 0).unwrap();

        let handles: Vec<_> = (2..10)
            .map(|i| {
                let graph = Arc::clone(&graph);
                thread::spawn(move || {
                    graph.put(oid(i), &[oid(1)], i as i64).unwrap();
                    // The edge written above must be observable now.
                    assert!(graph.is_ancestor(&oid(1), &oid(i)).unwrap());
                })
            })
            .collect();
        for h in handles {
            h.join().expect("writer panicked");
        }
        assert_eq!(graph.children(&oid(1)).unwrap().len(), 8);
    }
}
