//! Structural diff between two canonical trees.
//!
//! [`diff`] returns a lazy iterator of [`DiffEntry`] items. The traversal is
//! a synchronized recursive descent driven by an explicit frame stack, and
//! its dominant optimization is content addressing itself: wherever the two
//! sides carry the same id, the whole subtree is skipped without a single
//! store read. A consumer that stops pulling stops the traversal; nothing is
//! precomputed and there is no cleanup obligation.

pub mod entry;
pub mod error;
pub mod feature_diff;
pub mod tree_diff;

pub use entry::{ChangeType, DiffEntry};
pub use error::{DiffError, DiffResult};
pub use feature_diff::{attribute_diff, AttributeChange};
pub use tree_diff::{diff, TreeDiff};
