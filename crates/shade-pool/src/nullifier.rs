//! nullifiers for preventing double-spends
//!
//! when a note is spent, its nullifier is published.
//! if the nullifier is already in the registry, the spend is rejected.

use std::collections::HashSet;

use crate::error::PoolError;
use crate::hash::hash_newtype;
use crate::note::{Commitment, OwnerSecret};
use crate::NULLIFIER_DOMAIN;

hash_newtype!(
    /// nullifier - unique token for a spent note
    ///
    /// derived from the note commitment and the owner's secret, so only the
    /// owner can compute it and each note has exactly one
    Nullifier
);

impl Nullifier {
    pub fn derive(commitment: &Commitment, owner_secret: &OwnerSecret) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(NULLIFIER_DOMAIN);
        hasher.update(&owner_secret.0);
        hasher.update(&commitment.0);
        Self(*hasher.finalize().as_bytes())
    }
}

/// registry of spent nullifiers
///
/// entries are permanent. mutation only happens through the state
/// machine, inside the pool's exclusive section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NullifierRegistry {
    spent: HashSet<Nullifier>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// check if the note behind this nullifier was already spent
    pub fn is_spent(&self, nullifier: &Nullifier) -> bool {
        self.spent.contains(nullifier)
    }

    /// record a spend, rejecting replays
    pub(crate) fn spend(&mut self, nullifier: Nullifier) -> Result<(), PoolError> {
        if !self.spent.insert(nullifier) {
            return Err(PoolError::DoubleSpend(nullifier));
        }
        Ok(())
    }

    /// number of spent notes
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    /// spent nullifiers in canonical (sorted) order
    pub fn sorted(&self) -> Vec<Nullifier> {
        let mut all: Vec<_> = self.spent.iter().copied().collect();
        all.sort_unstable();
        all
    }
}
