use crate::alphabet::Alphabet;
use crate::errors::{PathError, PathResult};
use crate::segment::SegmentCoding;
use crate::NodeId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::{Debug, Display, Formatter, Write};

/// Smallest smallvec backing size that keeps typical paths (a handful of
/// fixed-width segments) off the heap.
pub const PATH_VECTOR_SIZE: usize = 24;

/// Underlying byte storage of a materialized path.
pub type PathVec = SmallVec<[u8; PATH_VECTOR_SIZE]>;

/// A materialized path: the concatenated segments of every ancestor id from
/// the root down to the node itself.
///
/// Comparison is byte-wise, which by construction equals pre-order tree
/// traversal. The empty path stands for the parent of a root node: it has
/// depth zero and every root path extends it.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Default, Serialize, Deserialize)]
pub struct NodePath {
    bytes: PathVec,
}

impl NodePath {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self { bytes: PathVec::from_slice(bytes) }
    }

    pub(crate) fn from_vec(bytes: PathVec) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn is_printable(&self) -> bool {
        self.bytes.iter().all(|&byte| byte.is_ascii_graphic() || byte == b' ')
    }
}

impl AsRef<[u8]> for NodePath {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for &byte in self.bytes.iter() {
            if byte.is_ascii_graphic() || byte == b' ' {
                f.write_char(byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl Debug for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_printable() {
            write!(f, "NodePath(\"{self}\")")
        } else {
            let mut buffer = vec![0u8; self.bytes.len() * 2];
            let hex = faster_hex::hex_encode(&self.bytes, &mut buffer).expect("destination is sized for the input");
            write!(f, "NodePath(0x{hex})")
        }
    }
}

/// The complete, immutable encoding configuration: one alphabet plus one
/// segment coding.
///
/// Changing either for an existing dataset is a full data migration, so a
/// codec is constructed once and passed by reference into every operation;
/// distinct codecs may coexist while a migration is in flight.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PathCodec {
    alphabet: Alphabet,
    coding: SegmentCoding,
}

impl PathCodec {
    pub fn new(alphabet: Alphabet, coding: SegmentCoding) -> PathResult<Self> {
        match coding {
            SegmentCoding::FixedWidth { width } => {
                if width == 0 {
                    return Err(PathError::ConfigurationError("fixed segment width must be at least 1".into()));
                }
            }
            SegmentCoding::LengthPrefixed => Self::verify_length_dominance(&alphabet)?,
        }
        Ok(Self { alphabet, coding })
    }

    /// Under length-prefixed coding, sort-order fidelity additionally needs
    /// every shorter segment to sort below every longer one. That holds when
    /// the length symbols themselves are ordered, but it is a data invariant,
    /// so it is checked empirically rather than assumed: for each payload
    /// length `l`, the largest `l`-payload segment must sort strictly below
    /// the smallest `(l+1)`-payload segment.
    fn verify_length_dominance(alphabet: &Alphabet) -> PathResult<()> {
        let base = alphabet.base();
        for length in 1..base - 1 {
            let mut largest = vec![alphabet.symbol(length)];
            largest.extend(std::iter::repeat_n(alphabet.symbol(base - 1), length));
            let mut smallest = vec![alphabet.symbol(length + 1), alphabet.symbol(1)];
            smallest.extend(std::iter::repeat_n(alphabet.symbol(0), length));
            if largest.as_slice() >= smallest.as_slice() {
                return Err(PathError::ConfigurationError(format!(
                    "length-prefixed segments of payload length {length} do not sort below length {}",
                    length + 1
                )));
            }
        }
        Ok(())
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn coding(&self) -> SegmentCoding {
        self.coding
    }

    /// Largest id this configuration can encode.
    pub fn max_id(&self) -> NodeId {
        self.coding.max_id(&self.alphabet)
    }

    /// Encodes a single id as a standalone segment, which is also the path
    /// of a root node carrying that id.
    pub fn segment(&self, id: NodeId) -> PathResult<NodePath> {
        self.build(&NodePath::empty(), id)
    }

    /// Consumes one segment from the front of `tail`, returning the decoded
    /// id and the remaining bytes.
    pub fn decode_one<'a>(&self, tail: &'a [u8]) -> PathResult<(NodeId, &'a [u8])> {
        self.coding.decode_one(&self.alphabet, tail)
    }

    /// Path of the node `id` under `parent`: the parent path plus one
    /// segment. Pass the empty path to build a root.
    pub fn build(&self, parent: &NodePath, id: NodeId) -> PathResult<NodePath> {
        let mut bytes = PathVec::from_slice(parent.as_bytes());
        self.coding.encode_into(&self.alphabet, id, &mut bytes)?;
        Ok(NodePath::from_vec(bytes))
    }

    /// Decodes a path into its root-to-node id chain. The empty path decodes
    /// to an empty chain; trailing bytes that do not form a complete final
    /// segment fail with [`PathError::CorruptPath`].
    pub fn decode(&self, path: &NodePath) -> PathResult<Vec<NodeId>> {
        let mut ids = Vec::new();
        let mut tail = path.as_bytes();
        while !tail.is_empty() {
            let (id, rest) = self.decode_one(tail)?;
            ids.push(id);
            tail = rest;
        }
        Ok(ids)
    }

    /// Number of segments in `path`.
    pub fn depth(&self, path: &NodePath) -> PathResult<usize> {
        let mut depth = 0;
        let mut tail = path.as_bytes();
        while !tail.is_empty() {
            tail = self.decode_one(tail)?.1;
            depth += 1;
        }
        Ok(depth)
    }

    /// Whether byte offset `target` lands on a segment boundary of `path`
    /// (offsets 0 and `path.len()` included).
    fn is_boundary(&self, path: &NodePath, target: usize) -> PathResult<bool> {
        let bytes = path.as_bytes();
        let mut offset = 0;
        while offset < target {
            let (_, rest) = self.decode_one(&bytes[offset..])?;
            offset = bytes.len() - rest.len();
        }
        Ok(offset == target)
    }

    /// True iff `ancestor` is a proper ancestor of `path`: the path starts
    /// with the ancestor path and continues with at least one complete
    /// segment. This is deliberately not a raw substring test: the byte
    /// prefix must also end on a segment boundary of `path`.
    pub fn is_descendant_of(&self, path: &NodePath, ancestor: &NodePath) -> PathResult<bool> {
        if ancestor.len() >= path.len() || !path.as_bytes().starts_with(ancestor.as_bytes()) {
            return Ok(false);
        }
        self.is_boundary(path, ancestor.len())
    }

    /// Ancestor prefix of `path` holding exactly `depth` segments.
    pub fn truncate(&self, path: &NodePath, depth: usize) -> PathResult<NodePath> {
        let bytes = path.as_bytes();
        let mut offset = 0;
        for level in 0..depth {
            if offset == bytes.len() {
                return Err(PathError::OutOfRange { requested: depth, actual: level });
            }
            let (_, rest) = self.decode_one(&bytes[offset..])?;
            offset = bytes.len() - rest.len();
        }
        Ok(NodePath::from_bytes(&bytes[..offset]))
    }

    /// Parent path of `path`: `None` for the empty path, the empty path for
    /// a root.
    pub fn parent(&self, path: &NodePath) -> PathResult<Option<NodePath>> {
        let depth = self.depth(path)?;
        if depth == 0 {
            return Ok(None);
        }
        Ok(Some(self.truncate(path, depth - 1)?))
    }

    /// Replaces the boundary-aligned `old_prefix` of `path` with
    /// `new_prefix`. The prefix may equal the whole path, since the subtree
    /// root's own row is rewritten during a re-parent too. Fails with
    /// [`PathError::PrefixMismatch`] when `path` does not start with
    /// `old_prefix` on a segment boundary.
    pub fn rewrite_prefix(&self, path: &NodePath, old_prefix: &NodePath, new_prefix: &NodePath) -> PathResult<NodePath> {
        let aligned = path.as_bytes().starts_with(old_prefix.as_bytes()) && self.is_boundary(path, old_prefix.len())?;
        if !aligned {
            return Err(PathError::PrefixMismatch { path: path.clone(), prefix: old_prefix.clone() });
        }
        let mut bytes = PathVec::from_slice(new_prefix.as_bytes());
        bytes.extend_from_slice(&path.as_bytes()[old_prefix.len()..]);
        Ok(NodePath::from_vec(bytes))
    }
}
