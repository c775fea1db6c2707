//! Integer ↔ symbol-string conversion in the base of an [`Alphabet`].

use crate::alphabet::Alphabet;
use crate::errors::{PathError, PathResult};
use crate::NodeId;
use smallvec::SmallVec;

/// Digit buffer; sized for the common bases, spills for tiny ones (base 2
/// needs up to 64 digits).
pub type DigitVec = SmallVec<[u8; 16]>;

/// Encodes `id` as a most-significant-first symbol string. No leading zero
/// symbols are produced, except for id 0 which encodes as the zero symbol
/// itself.
pub fn encode(alphabet: &Alphabet, id: NodeId) -> DigitVec {
    let base = alphabet.base() as u64;
    let mut digits = DigitVec::new();
    let mut value = id.value();
    loop {
        digits.push(alphabet.symbol((value % base) as usize));
        value /= base;
        if value == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

/// Decodes a most-significant-first symbol string back to an id.
///
/// Fails with [`PathError::InvalidSymbol`] on any byte outside the alphabet
/// and with [`PathError::CorruptPath`] if the digits overflow the id range
/// (no such string is ever produced by [`encode`]).
pub fn decode(alphabet: &Alphabet, symbols: &[u8]) -> PathResult<NodeId> {
    if symbols.is_empty() {
        return Err(PathError::CorruptPath("empty digit string".into()));
    }
    let base = alphabet.base() as u64;
    let mut value: u64 = 0;
    for &symbol in symbols {
        let digit = alphabet.value_of(symbol)? as u64;
        value = value
            .checked_mul(base)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| PathError::CorruptPath(format!("digit string of {} symbols overflows the id range", symbols.len())))?;
    }
    Ok(NodeId::new(value))
}
