//! shade privacy pool
//!
//! state engine for a shielded pool: deposits, withdrawals and shielded
//! swaps over an append-only commitment tree and a nullifier registry,
//! gated by succinct proofs that are verified outside this crate's trust
//! boundary.
//!
//! # architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         POOL                                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  requests (deposit / withdraw / trade / private order)       │
//! │  ├─ cheap rejects: root recency, nullifier unspent          │
//! │  ├─ proof gate: ProofVerifier + verifying key (no lock)     │
//! │  └─ exclusive section: re-check, custody, apply             │
//! │                                                              │
//! │  PoolState (single writer)                                   │
//! │  ├─ commitment tree (depth D arena, last K roots)           │
//! │  ├─ nullifier registry (spent set)                          │
//! │  └─ per-asset reserves, registered assets and pairs         │
//! │                                                              │
//! │  order book                                                  │
//! │  └─ epoch batches shuffled by a post-hoc beacon             │
//! │                                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! every successful transition emits a [`PoolEvent`]; rejected requests
//! leave the state untouched.

pub mod hash;
pub mod value;
pub mod note;
pub mod nullifier;
pub mod tree;
pub mod verifier;
pub mod custody;
pub mod events;
pub mod clock;
pub mod config;
pub mod error;
pub mod state;
pub mod machine;
pub mod batch;
pub mod beacon;
pub mod pool;

pub use hash::Hash;
pub use value::{Address, Amount, AssetId, PairId, TargetId, TradingPair};
pub use note::{Commitment, Note, OwnerSecret};
pub use nullifier::{Nullifier, NullifierRegistry};
pub use tree::{CommitmentTree, MerkleProof, MerkleRoot};
pub use verifier::{
    CircuitKind, DigestVerifier, ProofBundle, ProofGate, ProofVerifier, PublicInputs,
    VerifyingKey, VerifyingKeys,
};
pub use custody::{Custody, CustodyError, Direction, LedgerCustody};
pub use events::{EventKind, EventLog, EventSink, PoolEvent, TracingSink};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{BatchConfig, ConfigError, KeyConfig, PairConfig, PoolConfig};
pub use error::{PoolError, Result};
pub use state::{PoolState, PoolStatus};
pub use machine::{
    Deposit, Receipt, RequestId, RequestPhase, StateMachine, Validated, Verified, Withdrawal,
};
pub use batch::{BatchReport, OrderBook, OrderId, OrderOutcome, OrderState, PrivateOrder};
pub use beacon::{EntropyBeacon, FixedBeacon, OsBeacon, RandomnessBeacon};
pub use pool::{Collaborators, Pool};

/// domain separator for note commitments
pub const NOTE_DOMAIN: &[u8] = b"shade.pool.note.v1";
/// domain separator for nullifiers
pub const NULLIFIER_DOMAIN: &[u8] = b"shade.pool.nullifier.v1";
/// domain separator for interior tree nodes
pub const NODE_DOMAIN: &[u8] = b"shade.pool.merkle.node.v1";
/// domain separator for the canonical empty leaf
pub const EMPTY_LEAF_DOMAIN: &[u8] = b"shade.pool.merkle.empty.v1";
/// domain separator for asset ids
pub const ASSET_DOMAIN: &[u8] = b"shade.pool.asset.v1";
/// domain separator for trading pair ids
pub const PAIR_DOMAIN: &[u8] = b"shade.pool.pair.v1";
/// domain separator for batch digests and shuffle seeds
pub const BATCH_DOMAIN: &[u8] = b"shade.pool.batch.v1";
/// domain separator for beacon outputs
pub const BEACON_DOMAIN: &[u8] = b"shade.pool.beacon.v1";
/// blake3 key-derivation context for the digest verifier
pub const DIGEST_PROOF_CONTEXT: &str = "shade.pool 2025 digest-proof v1";
