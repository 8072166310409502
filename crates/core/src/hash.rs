//! Type identifiers
//!
//! Every type crossing the boundary is keyed by the FNV-1a hash of its
//! canonical name. The native engine computes the same hash on its side, so
//! the algorithm and the name fed into it must never change.

use std::fmt;

/// FNV-1a 32-bit hash (compile-time capable)
pub const fn fnv1a_32(data: &[u8]) -> u32 {
    const FNV_OFFSET_BASIS: u32 = 0x811c9dc5;
    const FNV_PRIME: u32 = 0x01000193;

    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < data.len() {
        hash ^= data[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Cross-boundary type identifier
///
/// A 32-bit hash of a type's canonical name. Two names hashing to the same
/// value are a configuration error that is not detected.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct TypeHash(pub u32);

impl TypeHash {
    /// Empty/invalid hash constant
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash a canonical type name
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        TypeHash(fnv1a_32(name.as_bytes()))
    }

    /// Raw hash value as passed over FFI
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<&str> for TypeHash {
    fn from(name: &str) -> Self {
        TypeHash::from_name(name)
    }
}

impl From<u32> for TypeHash {
    fn from(value: u32) -> Self {
        TypeHash(value)
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#010x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_32_empty() {
        // Empty string should return offset basis
        assert_eq!(fnv1a_32(b""), 0x811c9dc5);
    }

    #[test]
    fn test_fnv1a_32_basic() {
        // Known test vectors
        assert_eq!(fnv1a_32(b"a"), 0xe40c292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9cf968);
    }

    #[test]
    fn test_type_hash_deterministic() {
        assert_eq!(TypeHash::from_name("Foo"), TypeHash::from_name("Foo"));
        assert_ne!(TypeHash::from_name("Foo"), TypeHash::from_name("foo"));
        assert_eq!(TypeHash::from("Foo"), TypeHash::from_name("Foo"));
    }

    #[test]
    fn test_const_evaluation() {
        const HASH: TypeHash = TypeHash::from_name("WorkQueue");
        assert!(!HASH.is_empty());
        assert_eq!(HASH.value(), fnv1a_32(b"WorkQueue"));
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeHash(0xbf9cf968).to_string(), "#bf9cf968");
        assert_eq!(format!("{:?}", TypeHash(1)), "TypeHash(0x00000001)");
    }
}
