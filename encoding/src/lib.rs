//! Materialized-path encoding for tree-shaped data kept in a flat,
//! byte-ordered column.
//!
//! A node's path is the concatenation of one encoded segment per ancestor,
//! root first. Segments are built so that comparing whole paths byte-wise
//! equals comparing tree positions in pre-order, which makes three storage
//! operations cheap: ordered traversal (sort by the column), descendant
//! lookup (prefix range scan) and re-parenting (prefix rewrite).
//!
//! Everything in this crate is pure: the encoding configuration is an
//! explicit [`PathCodec`] value passed into every operation, so distinct
//! configurations can coexist in one process (e.g. while migrating a
//! dataset from one base or coding to another).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

mod alphabet;
pub mod codec;
mod errors;
mod path;
mod segment;

pub use alphabet::{Alphabet, Collation, MAX_BINARY_BASE, MAX_CASE_INSENSITIVE_BASE};
pub use errors::{PathError, PathResult};
pub use path::{NodePath, PathCodec, PathVec, PATH_VECTOR_SIZE};
pub use segment::SegmentCoding;

/// Caller-assigned node identifier. Opaque to the engine apart from being a
/// non-negative integer; uniqueness per node is the caller's contract.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<NodeId> for u64 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
