//! Commit ancestry graph for geovc.
//!
//! Tracks the DAG of commit ids and parent edges, separately from commit
//! payloads: every query here works on ids, edges, and the small timestamp
//! recorded at [`put`] time, so ancestry questions never deserialize
//! commits. Supports reachability, merge-base discovery (lowest common
//! ancestors, criss-cross aware), and topological ordering for log display.
//!
//! [`put`]: GraphDatabase::put

pub mod error;
pub mod heap;
pub mod traits;

pub use error::{GraphError, GraphResult};
pub use heap::HeapGraphDatabase;
pub use traits::GraphDatabase;
