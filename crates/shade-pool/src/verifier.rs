//! proof verification gate
//!
//! the pairing check itself is circuit specific and lives outside this
//! crate behind [`ProofVerifier`]. the gate owns the verifying keys (fixed
//! at setup) and runs the cheap rejects, root recency and nullifier
//! freshness, before it spends time on the cryptographic check.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PoolError;
use crate::note::Commitment;
use crate::nullifier::Nullifier;
use crate::state::PoolState;
use crate::tree::MerkleRoot;
use crate::value::{Amount, AssetId, TargetId};
use crate::DIGEST_PROOF_CONTEXT;

/// which circuit a proof was produced for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitKind {
    Deposit,
    Withdraw,
    Trade,
}

impl CircuitKind {
    fn tag(self) -> u8 {
        match self {
            CircuitKind::Deposit => 0,
            CircuitKind::Withdraw => 1,
            CircuitKind::Trade => 2,
        }
    }
}

impl core::fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            CircuitKind::Deposit => "deposit",
            CircuitKind::Withdraw => "withdraw",
            CircuitKind::Trade => "trade",
        })
    }
}

/// public inputs shared between the prover and the pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    /// tree root the membership witness was built against
    pub root: MerkleRoot,
    /// nullifier of the spent note
    pub nullifier: Nullifier,
    /// recipient address (withdraw) or pair id (trade)
    pub target: TargetId,
    /// asset of the spent note
    pub asset: AssetId,
    /// exact public amount released by a withdrawal, zero for trades
    pub amount: Amount,
    /// post-trade note commitment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_commitment: Option<Commitment>,
}

impl PublicInputs {
    /// canonical encoding handed to verifiers
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(32 * 5 + 16 + 1);
        bytes.extend_from_slice(&self.root.0);
        bytes.extend_from_slice(&self.nullifier.0);
        bytes.extend_from_slice(&self.target.0);
        bytes.extend_from_slice(&self.asset.0);
        bytes.extend_from_slice(&self.amount.to_le_bytes());
        match &self.output_commitment {
            Some(c) => {
                bytes.push(1);
                bytes.extend_from_slice(&c.0);
            }
            None => bytes.push(0),
        }
        bytes
    }
}

/// proof object as produced by the external proving toolchain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    pub public_inputs: PublicInputs,
    #[serde(with = "hex_bytes")]
    pub proof_blob: Vec<u8>,
}

impl ProofBundle {
    pub fn new(public_inputs: PublicInputs, proof_blob: Vec<u8>) -> Self {
        Self { public_inputs, proof_blob }
    }
}

/// opaque verifying key for one circuit
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey(#[serde(with = "hex_bytes")] pub Vec<u8>);

impl VerifyingKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "VerifyingKey({} bytes)", self.0.len())
    }
}

/// one verifying key per circuit, immutable after setup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKeys {
    pub deposit: VerifyingKey,
    pub withdraw: VerifyingKey,
    pub trade: VerifyingKey,
}

impl VerifyingKeys {
    pub fn for_circuit(&self, circuit: CircuitKind) -> &VerifyingKey {
        match circuit {
            CircuitKind::Deposit => &self.deposit,
            CircuitKind::Withdraw => &self.withdraw,
            CircuitKind::Trade => &self.trade,
        }
    }

    /// well-known keys for local runs and tests
    pub fn development() -> Self {
        Self {
            deposit: VerifyingKey::from_bytes(&b"shade.dev.vk.deposit"[..]),
            withdraw: VerifyingKey::from_bytes(&b"shade.dev.vk.withdraw"[..]),
            trade: VerifyingKey::from_bytes(&b"shade.dev.vk.trade"[..]),
        }
    }
}

/// cryptographic proof check
///
/// must be a pure function of its arguments: no side effects and no state
/// beyond the key
pub trait ProofVerifier: Send + Sync {
    fn verify(
        &self,
        circuit: CircuitKind,
        inputs: &PublicInputs,
        proof: &[u8],
        key: &VerifyingKey,
    ) -> bool;
}

/// development backend: the "proof" is a keyed blake3 mac over the public
/// inputs under the verifying key
///
/// binds every public input and the circuit, but proves nothing about the
/// private witness. never deploy it in front of real funds.
#[derive(Clone, Copy, Debug, Default)]
pub struct DigestVerifier;

impl DigestVerifier {
    /// produce a blob this verifier accepts
    pub fn prove(circuit: CircuitKind, inputs: &PublicInputs, key: &VerifyingKey) -> Vec<u8> {
        Self::digest(circuit, inputs, key).as_bytes().to_vec()
    }

    fn digest(circuit: CircuitKind, inputs: &PublicInputs, key: &VerifyingKey) -> blake3::Hash {
        let mac_key = blake3::derive_key(DIGEST_PROOF_CONTEXT, key.as_bytes());
        let mut hasher = blake3::Hasher::new_keyed(&mac_key);
        hasher.update(&[circuit.tag()]);
        hasher.update(&inputs.to_bytes());
        hasher.finalize()
    }
}

impl ProofVerifier for DigestVerifier {
    fn verify(
        &self,
        circuit: CircuitKind,
        inputs: &PublicInputs,
        proof: &[u8],
        key: &VerifyingKey,
    ) -> bool {
        let Ok(blob) = <[u8; 32]>::try_from(proof) else {
            return false;
        };
        // blake3::Hash equality is constant time
        Self::digest(circuit, inputs, key) == blake3::Hash::from(blob)
    }
}

/// verifier plus the process-wide verifying keys
#[derive(Clone)]
pub struct ProofGate {
    verifier: Arc<dyn ProofVerifier>,
    keys: Arc<VerifyingKeys>,
}

impl ProofGate {
    pub fn new(verifier: Arc<dyn ProofVerifier>, keys: VerifyingKeys) -> Self {
        Self {
            verifier,
            keys: Arc::new(keys),
        }
    }

    pub fn keys(&self) -> &VerifyingKeys {
        &self.keys
    }

    /// cheap rejects against current state: stale root, spent nullifier
    pub fn precheck(&self, state: &PoolState, inputs: &PublicInputs) -> Result<(), PoolError> {
        if !state.is_recent_root(&inputs.root) {
            return Err(PoolError::StaleRoot(inputs.root));
        }
        if state.is_spent(&inputs.nullifier) {
            return Err(PoolError::DoubleSpend(inputs.nullifier));
        }
        Ok(())
    }

    /// the expensive check; touches no pool state
    pub fn verify(
        &self,
        circuit: CircuitKind,
        inputs: &PublicInputs,
        proof: &[u8],
    ) -> Result<(), PoolError> {
        let key = self.keys.for_circuit(circuit);
        if self.verifier.verify(circuit, inputs, proof, key) {
            Ok(())
        } else {
            Err(PoolError::InvalidProof(circuit))
        }
    }
}

/// hex (de)serialization for byte vectors
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
