use smallvec::SmallVec;
use std::fmt::{Debug, Display, Formatter};

/// A database key: a store bucket prefix followed by the key payload.
/// Buckets keep unrelated stores apart in one column family while keeping
/// the payload's byte order intact inside each bucket, so range scans over
/// a bucket see payloads in their own order.
#[derive(PartialEq, Eq, Clone, Hash)]
pub struct DbKey {
    path: SmallVec<[u8; 36]>,
    prefix_len: usize,
}

impl DbKey {
    pub fn new<TKey: AsRef<[u8]>>(prefix: &[u8], key: TKey) -> Self {
        Self {
            path: prefix.iter().chain(key.as_ref().iter()).copied().collect(),
            prefix_len: prefix.len(),
        }
    }

    pub fn prefix_only(prefix: &[u8]) -> Self {
        Self::new(prefix, [])
    }

    /// Extends the logical prefix with a sub-bucket; subsequent range scans
    /// treat the appended bytes as part of the prefix.
    pub fn add_bucket<TBucket: AsRef<[u8]>>(&mut self, bucket: TBucket) {
        self.path.extend_from_slice(bucket.as_ref());
        self.prefix_len += bucket.as_ref().len();
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }
}

impl AsRef<[u8]> for DbKey {
    fn as_ref(&self) -> &[u8] {
        &self.path
    }
}

impl Display for DbKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut buffer = vec![0u8; self.path.len() * 2];
        let hex = faster_hex::hex_encode(&self.path, &mut buffer).expect("destination is sized for the input");
        write!(f, "{}/{}", &hex[..self.prefix_len * 2], &hex[self.prefix_len * 2..])
    }
}

impl Debug for DbKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
