//! shielded notes and their commitments
//!
//! the engine only ever sees the commitment. `Note` is the wallet-side
//! preimage, kept here so tooling and tests derive commitments and
//! nullifiers exactly the way the circuit expects.

use crate::hash::hash_newtype;
use crate::nullifier::Nullifier;
use crate::value::{Amount, AssetId};
use crate::NOTE_DOMAIN;

hash_newtype!(
    /// commitment to a note (what goes in the commitment tree)
    Commitment
);

/// spend authority for a note, never leaves the wallet
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OwnerSecret(pub [u8; 32]);

impl OwnerSecret {
    pub fn random<R: rand::RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl core::fmt::Debug for OwnerSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("OwnerSecret(..)")
    }
}

/// a shielded note (the "utxo")
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub amount: Amount,
    pub asset: AssetId,
    pub owner_secret: OwnerSecret,
    /// blinding randomness
    pub randomness: [u8; 32],
}

impl Note {
    pub fn new(amount: Amount, asset: AssetId, owner_secret: OwnerSecret, randomness: [u8; 32]) -> Self {
        Self { amount, asset, owner_secret, randomness }
    }

    /// fresh note with random blinding
    pub fn random<R: rand::RngCore>(
        amount: Amount,
        asset: AssetId,
        owner_secret: OwnerSecret,
        rng: &mut R,
    ) -> Self {
        let mut randomness = [0u8; 32];
        rng.fill_bytes(&mut randomness);
        Self::new(amount, asset, owner_secret, randomness)
    }

    /// compute note commitment (published on deposit)
    pub fn commit(&self) -> Commitment {
        let mut hasher = blake3::Hasher::new();
        hasher.update(NOTE_DOMAIN);
        hasher.update(&self.amount.to_le_bytes());
        hasher.update(&self.asset.0);
        hasher.update(&self.owner_secret.0);
        hasher.update(&self.randomness);
        Commitment(*hasher.finalize().as_bytes())
    }

    /// nullifier revealed when this note is spent
    pub fn nullifier(&self) -> Nullifier {
        Nullifier::derive(&self.commit(), &self.owner_secret)
    }
}
