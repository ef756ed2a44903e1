//! Run-scoped bookkeeping of claimed entry-point names.
//!
//! One [`EntryPointRegistry`] is created per generation run and threaded
//! through the signature encoder, so every target can check its entry points
//! against every target encoded before it. Two runs never share a registry.

use rustc_hash::FxHashMap;

use jnibridge_core::ClassName;

/// The binding that owns an entry-point name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub class: ClassName,
    pub method: String,
    pub descriptor: String,
}

impl Claim {
    pub fn new(class: ClassName, method: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            class,
            method: method.into(),
            descriptor: descriptor.into(),
        }
    }
}

impl std::fmt::Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}{}", self.class, self.method, self.descriptor)
    }
}

/// A claim that lost to an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub entry_point: String,
    /// The claim that was rejected.
    pub rejected: Claim,
    /// The claim already holding the name.
    pub existing: Claim,
}

/// Entry-point names claimed so far in one run.
#[derive(Debug, Default)]
pub struct EntryPointRegistry {
    claims: FxHashMap<String, Claim>,
}

impl EntryPointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Who owns `entry_point`, if anyone.
    pub fn owner(&self, entry_point: &str) -> Option<&Claim> {
        self.claims.get(entry_point)
    }

    pub fn is_claimed(&self, entry_point: &str) -> bool {
        self.claims.contains_key(entry_point)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Claim every name of one target, or none of them.
    ///
    /// Fails on the first name that is already claimed, either by an earlier
    /// target or twice within `claims`. A failed call leaves the registry
    /// unchanged, so a rejected target does not reserve names.
    pub fn claim_all(&mut self, claims: Vec<(String, Claim)>) -> Result<(), Conflict> {
        let mut pending: FxHashMap<&str, &Claim> = FxHashMap::default();
        for (entry_point, claim) in &claims {
            let existing = self
                .claims
                .get(entry_point)
                .or_else(|| pending.get(entry_point.as_str()).copied());
            if let Some(existing) = existing {
                return Err(Conflict {
                    entry_point: entry_point.clone(),
                    rejected: claim.clone(),
                    existing: existing.clone(),
                });
            }
            pending.insert(entry_point, claim);
        }
        drop(pending);

        self.claims.extend(claims);
        Ok(())
    }
}
