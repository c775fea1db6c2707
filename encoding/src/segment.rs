use crate::alphabet::Alphabet;
use crate::codec;
use crate::errors::{PathError, PathResult};
use crate::path::PathVec;
use crate::NodeId;
use serde::{Deserialize, Serialize};

/// How one node id is framed inside a path.
///
/// A dataset commits to exactly one coding; mixing codings within a path
/// column is a data migration, not a runtime option.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum SegmentCoding {
    /// Exactly `width` symbols, left-padded with the zero symbol.
    /// Capacity: `base^width - 1`.
    FixedWidth { width: usize },
    /// One length symbol (numeral value = payload length) followed by that
    /// many payload symbols. Capacity: `base^(base-1) - 1`, saturated at
    /// the id range.
    LengthPrefixed,
}

impl SegmentCoding {
    /// Largest id representable under this coding with `alphabet`.
    pub fn max_id(&self, alphabet: &Alphabet) -> NodeId {
        let base = alphabet.base() as u64;
        let symbols = match self {
            SegmentCoding::FixedWidth { width } => *width,
            SegmentCoding::LengthPrefixed => alphabet.base() - 1,
        };
        let mut max: u64 = 0;
        for _ in 0..symbols {
            max = match max.checked_mul(base).and_then(|v| v.checked_add(base - 1)) {
                Some(value) => value,
                None => return NodeId::new(u64::MAX),
            };
        }
        NodeId::new(max)
    }

    /// Appends the segment for `id` to `out`. Fails with
    /// [`PathError::CapacityExceeded`] when the id does not fit; nothing is
    /// ever truncated to force a fit.
    pub(crate) fn encode_into(&self, alphabet: &Alphabet, id: NodeId, out: &mut PathVec) -> PathResult<()> {
        let digits = codec::encode(alphabet, id);
        match self {
            SegmentCoding::FixedWidth { width } => {
                if digits.len() > *width {
                    return Err(PathError::CapacityExceeded(id));
                }
                out.extend(std::iter::repeat_n(alphabet.zero(), width - digits.len()));
                out.extend_from_slice(&digits);
            }
            SegmentCoding::LengthPrefixed => {
                if digits.len() >= alphabet.base() {
                    return Err(PathError::CapacityExceeded(id));
                }
                out.push(alphabet.symbol(digits.len()));
                out.extend_from_slice(&digits);
            }
        }
        Ok(())
    }

    /// Consumes exactly one segment from the front of `tail`, returning the
    /// decoded id and the remaining bytes. Segments are self-delimiting, so
    /// no separator is needed between them.
    pub(crate) fn decode_one<'a>(&self, alphabet: &Alphabet, tail: &'a [u8]) -> PathResult<(NodeId, &'a [u8])> {
        match self {
            SegmentCoding::FixedWidth { width } => {
                if tail.len() < *width {
                    return Err(PathError::CorruptPath(format!(
                        "{} trailing bytes do not form a complete {width}-symbol segment",
                        tail.len()
                    )));
                }
                let (segment, rest) = tail.split_at(*width);
                Ok((codec::decode(alphabet, segment)?, rest))
            }
            SegmentCoding::LengthPrefixed => {
                let (&length_symbol, payload_tail) =
                    tail.split_first().ok_or_else(|| PathError::CorruptPath("empty segment".into()))?;
                let length = alphabet.value_of(length_symbol)?;
                if length == 0 {
                    return Err(PathError::CorruptPath("segment announces a zero-length payload".into()));
                }
                if payload_tail.len() < length {
                    return Err(PathError::CorruptPath(format!(
                        "length symbol announces {length} payload symbols but only {} remain",
                        payload_tail.len()
                    )));
                }
                let (payload, rest) = payload_tail.split_at(length);
                if length > 1 && payload[0] == alphabet.zero() {
                    // A zero-padded payload is a second spelling of a smaller
                    // id, which would break the one-segment-per-id order.
                    return Err(PathError::CorruptPath("segment payload has a leading zero symbol".into()));
                }
                Ok((codec::decode(alphabet, payload)?, rest))
            }
        }
    }
}
