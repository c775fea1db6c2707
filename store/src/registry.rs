use enum_primitive_derive::Primitive;

/// Bucket prefixes for the stores in this crate. Values are stable on disk;
/// never reuse one for a different purpose.
#[derive(Primitive, Debug, Clone, Copy)]
#[repr(u8)]
pub enum StorePrefixes {
    /// id -> path, point lookups
    PathById = 1,
    /// path -> id, pre-order prefix scans
    IdByPath = 2,
}

impl From<StorePrefixes> for Vec<u8> {
    fn from(value: StorePrefixes) -> Self {
        [value as u8].to_vec()
    }
}

impl From<StorePrefixes> for u8 {
    fn from(value: StorePrefixes) -> Self {
        value as u8
    }
}

impl AsRef<[u8]> for StorePrefixes {
    fn as_ref(&self) -> &[u8] {
        // SAFETY: enum has repr(u8)
        std::slice::from_ref(unsafe { &*(self as *const Self as *const u8) })
    }
}
