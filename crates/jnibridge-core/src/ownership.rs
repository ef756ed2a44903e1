//! Reference ownership classification.

use std::fmt;

/// Who is responsible for a value once it crosses into native code.
///
/// Assigned per type by the type mapper and consumed by the emitter, which
/// must release every [`OwnershipClass::OwnedRef`] it acquires on every exit
/// path of a stub, or transfer it to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OwnershipClass {
    /// Copied by value; nothing to release.
    ByValue,
    /// A local reference the runtime keeps alive for the duration of the call.
    BorrowedRef,
    /// A resource the stub acquires and must release (or hand off).
    OwnedRef,
}

impl OwnershipClass {
    /// Whether the emitter has to pair this value with a release.
    pub const fn needs_release(self) -> bool {
        matches!(self, OwnershipClass::OwnedRef)
    }

    pub const fn name(self) -> &'static str {
        match self {
            OwnershipClass::ByValue => "by-value",
            OwnershipClass::BorrowedRef => "borrowed",
            OwnershipClass::OwnedRef => "owned",
        }
    }
}

impl fmt::Display for OwnershipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
