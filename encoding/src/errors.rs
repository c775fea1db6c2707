use crate::path::NodePath;
use crate::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The id does not fit the configured segment coding. Never downgraded
    /// to truncation: an id either encodes exactly or not at all.
    #[error("id {0} does not fit the configured segment coding")]
    CapacityExceeded(NodeId),

    #[error("symbol {0:#04x} is not part of the alphabet")]
    InvalidSymbol(u8),

    #[error("corrupt path: {0}")]
    CorruptPath(String),

    #[error("path {path:?} does not start with prefix {prefix:?} on a segment boundary")]
    PrefixMismatch { path: NodePath, prefix: NodePath },

    #[error("depth {requested} is out of range for a path of depth {actual}")]
    OutOfRange { requested: usize, actual: usize },

    #[error("unsafe encoding configuration: {0}")]
    ConfigurationError(String),
}

pub type PathResult<T> = std::result::Result<T, PathError>;
