use std::collections::{BTreeSet, HashMap, VecDeque};

use geovc_types::ObjectId;

use crate::error::{GraphError, GraphResult};

const FROM_LEFT: u8 = 1;
const FROM_RIGHT: u8 = 2;

/// The commit ancestry graph contract.
///
/// A backend stores nodes (commit ids plus a timestamp) and parent edges.
/// Mutation must be atomic with respect to the query methods: once `put`
/// returns, `parents` and every provided ancestry query observe the new
/// edges. The provided queries are implemented purely in terms of
/// `contains`/`parents`/`timestamp`, so a persisted backend only implements
/// the primitives.
pub trait GraphDatabase: Send + Sync {
    /// Record a commit and its parent edges.
    ///
    /// Parents must already be present (roots pass an empty slice). Returns
    /// `false` when the commit was already known with the same parents and
    /// timestamp (idempotent no-op); a differing timestamp counts as a
    /// re-record and updates the stored value. Re-mapping an existing commit
    /// to different parents re-links the edges and fails with
    /// [`GraphError::CyclicGraph`] if the new edges would make the commit
    /// its own ancestor.
    ///
    /// `timestamp_ms` is the commit timestamp, recorded so ordering queries
    /// never have to read commit payloads.
    fn put(
        &self,
        commit_id: ObjectId,
        parent_ids: &[ObjectId],
        timestamp_ms: i64,
    ) -> GraphResult<bool>;

    fn contains(&self, id: &ObjectId) -> GraphResult<bool>;

    /// Parent ids in recorded order. Fails with `NotFound` for unknown ids.
    fn parents(&self, id: &ObjectId) -> GraphResult<Vec<ObjectId>>;

    /// Reverse index: commits that list `id` as a parent.
    fn children(&self, id: &ObjectId) -> GraphResult<Vec<ObjectId>>;

    /// The timestamp recorded for a commit at `put` time.
    fn timestamp(&self, id: &ObjectId) -> GraphResult<i64>;

    // -------------------------------------------------------------------
    // Provided ancestry queries
    // -------------------------------------------------------------------

    /// Distance from `id` to its nearest root (a root has depth 0).
    fn depth(&self, id: &ObjectId) -> GraphResult<u64> {
        if !self.contains(id)? {
            return Err(GraphError::NotFound(*id));
        }
        let mut queue = VecDeque::from([(*id, 0u64)]);
        let mut visited = BTreeSet::from([*id]);
        while let Some((current, d)) = queue.pop_front() {
            let parents = self.parents(&current)?;
            if parents.is_empty() {
                return Ok(d);
            }
            for parent in parents {
                if visited.insert(parent) {
                    queue.push_back((parent, d + 1));
                }
            }
        }
        // Acyclic graphs always reach a root.
        Ok(0)
    }

    /// Whether `a` is reachable from `b` by following parent edges.
    ///
    /// Reflexive: a commit is its own ancestor. Unknown ids are simply not
    /// ancestors of anything.
    fn is_ancestor(&self, a: &ObjectId, b: &ObjectId) -> GraphResult<bool> {
        if !self.contains(a)? || !self.contains(b)? {
            return Ok(false);
        }
        if a == b {
            return Ok(true);
        }
        let mut visited = BTreeSet::from([*b]);
        let mut queue = VecDeque::from([*b]);
        while let Some(current) = queue.pop_front() {
            for parent in self.parents(&current)? {
                if parent == *a {
                    return Ok(true);
                }
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        Ok(false)
    }

    /// Lowest common ancestors of `a` and `b`.
    ///
    /// Bidirectional breadth-first traversal following parent edges from
    /// both commits, marking each visited node with the side(s) that reached
    /// it. A node first marked by both sides is a candidate and is not
    /// expanded further; candidates that are ancestors of another candidate
    /// are discarded. A single survivor is *the* merge base; multiple
    /// survivors mean a criss-cross history and the caller picks a policy.
    fn merge_base(&self, a: &ObjectId, b: &ObjectId) -> GraphResult<Vec<ObjectId>> {
        if !self.contains(a)? || !self.contains(b)? {
            return Ok(Vec::new());
        }
        if a == b {
            return Ok(vec![*a]);
        }

        let mut marks: HashMap<ObjectId, u8> = HashMap::new();
        let mut queue: VecDeque<(ObjectId, u8)> = VecDeque::new();
        queue.push_back((*a, FROM_LEFT));
        queue.push_back((*b, FROM_RIGHT));
        let mut candidates: BTreeSet<ObjectId> = BTreeSet::new();

        while let Some((current, side)) = queue.pop_front() {
            let mark = marks.entry(current).or_insert(0);
            if *mark & side != 0 {
                continue;
            }
            *mark |= side;
            if *mark == FROM_LEFT | FROM_RIGHT {
                // Shared: everything above it is shared too, and strictly
                // less recent, so the frontier stops here.
                candidates.insert(current);
                continue;
            }
            for parent in self.parents(&current)? {
                queue.push_back((parent, side));
            }
        }

        // Keep only the maximal candidates.
        let all: Vec<ObjectId> = candidates.iter().copied().collect();
        let mut bases = Vec::new();
        'outer: for c in &all {
            for d in &all {
                if c != d && self.is_ancestor(c, d)? {
                    continue 'outer;
                }
            }
            bases.push(*c);
        }
        Ok(bases)
    }

    /// Order commits so every commit precedes its ancestors, breaking ties
    /// by timestamp descending (log display order).
    ///
    /// Operates on the induced ancestry among the given ids, so the ids need
    /// not be directly connected. Quadratic in the number of ids; meant for
    /// merge-base candidate sets and log pages, not the whole graph.
    fn topo_order(&self, ids: &[ObjectId]) -> GraphResult<Vec<ObjectId>> {
        let mut unique: Vec<ObjectId> = Vec::new();
        for id in ids {
            if !self.contains(id)? {
                return Err(GraphError::NotFound(*id));
            }
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        let n = unique.len();

        // ancestor_of[i][j]: unique[i] is a strict ancestor of unique[j].
        let mut ancestor_of = vec![vec![false; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    ancestor_of[i][j] = self.is_ancestor(&unique[i], &unique[j])?;
                }
            }
        }

        // A commit may be emitted once all its descendants in the set are.
        let mut pending: Vec<usize> = (0..n).collect();
        let mut remaining_descendants: Vec<usize> = (0..n)
            .map(|i| (0..n).filter(|&j| ancestor_of[i][j]).count())
            .collect();

        let mut result = Vec::with_capacity(n);
        while !pending.is_empty() {
            let mut best: Option<usize> = None;
            for &i in &pending {
                if remaining_descendants[i] == 0 {
                    let better = match best {
                        None => true,
                        Some(b) => self.timestamp(&unique[i])? > self.timestamp(&unique[b])?,
                    };
                    if better {
                        best = Some(i);
                    }
                }
            }
            // The induced relation is acyclic, so something is always ready.
            let chosen = best.expect("acyclic ancestry always has a ready commit");
            pending.retain(|&i| i != chosen);
            for i in 0..n {
                if ancestor_of[i][chosen] {
                    remaining_descendants[i] -= 1;
                }
            }
            result.push(unique[chosen]);
        }
        Ok(result)
    }
}
