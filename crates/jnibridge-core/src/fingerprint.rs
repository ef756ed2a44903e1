//! Deterministic fingerprints over registration tables.
//!
//! A [`Fingerprint`] is a 64-bit hash that identifies the exact set and order of
//! native bindings a generated artifact registers. It is stamped into the
//! registration unit so a loader can check that the native library and the
//! managed classes were generated together.
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants so that a class name and
//! a method name with the same spelling contribute differently, and a
//! multiply-add chain so that entry order matters.
//!
//! # Examples
//!
//! ```
//! use jnibridge_core::Fingerprint;
//!
//! let a = Fingerprint::from_entry("com/example/Math", "add", "(II)I", "Java_com_example_Math_add");
//! let b = Fingerprint::from_entry("com/example/Math", "add", "(II)I", "Java_com_example_Math_add");
//! assert_eq!(a, b); // Deterministic
//!
//! let ab = Fingerprint::EMPTY.chain(a).chain(Fingerprint::from_name("x"));
//! let ba = Fingerprint::EMPTY.chain(Fingerprint::from_name("x")).chain(a);
//! assert_ne!(ab, ba); // Order matters
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for fingerprint computation.
pub mod hash_constants {
    /// Chaining multiplier between successive components
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for class names
    pub const CLASS: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for method names
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for descriptors
    pub const DESCRIPTOR: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for entry-point symbols
    pub const ENTRY_POINT: u64 = 0x9a7f3d5e2b8c4601;

    /// Domain marker for bare names
    pub const NAME: u64 = 0x1a095090689d4647;
}

/// A deterministic 64-bit fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Fingerprint of nothing; the seed of every chain.
    pub const EMPTY: Fingerprint = Fingerprint(0);

    /// Fingerprint a bare name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        Fingerprint(hash_constants::NAME ^ xxh64(name.as_bytes(), 0))
    }

    /// Fingerprint one registration entry.
    #[inline]
    pub fn from_entry(class: &str, method: &str, descriptor: &str, entry_point: &str) -> Self {
        let parts = [
            hash_constants::CLASS ^ xxh64(class.as_bytes(), 0),
            hash_constants::METHOD ^ xxh64(method.as_bytes(), 0),
            hash_constants::DESCRIPTOR ^ xxh64(descriptor.as_bytes(), 0),
            hash_constants::ENTRY_POINT ^ xxh64(entry_point.as_bytes(), 0),
        ];
        let mut hash = 0u64;
        for part in parts {
            hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(part);
        }
        Fingerprint(hash)
    }

    /// Append `next` to this chain. Not commutative.
    #[inline]
    pub fn chain(self, next: Fingerprint) -> Self {
        Fingerprint(self.0.wrapping_mul(hash_constants::SEP).wrapping_add(next.0))
    }

    /// Check if this is the empty fingerprint.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:#018x})", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_components_are_domain_separated() {
        let a = Fingerprint::from_entry("x", "y", "()V", "s");
        let b = Fingerprint::from_entry("y", "x", "()V", "s");
        assert_ne!(a, b);
    }

    #[test]
    fn chain_from_empty_is_not_identity_for_two_items() {
        let x = Fingerprint::from_name("x");
        let y = Fingerprint::from_name("y");
        assert_ne!(
            Fingerprint::EMPTY.chain(x).chain(y),
            Fingerprint::EMPTY.chain(y).chain(x)
        );
    }

    #[test]
    fn display_is_fixed_width_hex() {
        assert_eq!(Fingerprint(0xab).to_string(), "0x00000000000000ab");
        assert!(Fingerprint::EMPTY.is_empty());
    }
}
