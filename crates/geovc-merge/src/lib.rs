//! Three-way merge of feature snapshots.
//!
//! [`merge`] resolves the common ancestor of two commits through the commit
//! graph and combines their changes relative to it; [`merge_trees`] does the
//! same for three tree ids directly. A clean merge produces a new canonical
//! tree id; incompatible edits come back as a [`Conflict`] set, sorted by
//! path, with no partial tree materialized. Conflicts are data, not errors:
//! [`MergeError`] is reserved for broken inputs like missing objects or
//! unrelated histories.

pub mod engine;
pub mod error;
pub mod outcome;

pub use engine::{merge, merge_trees};
pub use error::{MergeError, MergeResult};
pub use outcome::{Conflict, MergeOutcome};
