//! error types for the pool
//!
//! every variant is a terminal rejection: the request is dropped and the
//! pool state is exactly what it was before the request arrived. retries
//! (e.g. re-proving against a fresher root) belong to the caller.

use thiserror::Error;

use crate::batch::OrderId;
use crate::custody::CustodyError;
use crate::nullifier::Nullifier;
use crate::tree::MerkleRoot;
use crate::value::{Amount, AssetId, PairId};
use crate::verifier::CircuitKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("invalid {0} proof")]
    InvalidProof(CircuitKind),

    #[error("nullifier {0} already spent")]
    DoubleSpend(Nullifier),

    #[error("root {0} is neither current nor within the recent-root window")]
    StaleRoot(MerkleRoot),

    #[error("commitment tree is full ({capacity} leaves)")]
    CapacityExceeded { capacity: u64 },

    #[error("asset {0} is not registered")]
    UnsupportedAsset(AssetId),

    #[error("order {0} expired before its batch closed")]
    BatchExpired(OrderId),

    #[error("trading pair {0} is not registered")]
    UnsupportedPair(PairId),

    #[error("amount {amount} is below the minimum deposit {minimum}")]
    AmountBelowMinimum { amount: Amount, minimum: Amount },

    #[error("reserve of {asset} holds {available}, {requested} requested")]
    InsufficientReserves {
        asset: AssetId,
        available: Amount,
        requested: Amount,
    },

    #[error("recipient does not match the proof's public target")]
    RecipientMismatch,

    #[error("trade proof carries no output commitment")]
    MissingOutputCommitment,

    #[error("no commitment at leaf index {0}")]
    UnknownLeaf(u64),

    #[error("order {0} not found")]
    UnknownOrder(OrderId),

    #[error("order {0} belongs to another submitter")]
    NotOrderOwner(OrderId),

    #[error("nullifier {0} already has a pending order")]
    DuplicateOrder(Nullifier),

    #[error("open epoch already holds {max_orders} orders")]
    BatchFull { max_orders: usize },

    #[error("custody transfer failed: {0}")]
    Custody(#[from] CustodyError),

    #[error("reserve arithmetic overflow")]
    Overflow,
}

impl PoolError {
    /// stable short name, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            PoolError::InvalidProof(_) => "invalid_proof",
            PoolError::DoubleSpend(_) => "double_spend",
            PoolError::StaleRoot(_) => "stale_root",
            PoolError::CapacityExceeded { .. } => "capacity_exceeded",
            PoolError::UnsupportedAsset(_) => "unsupported_asset",
            PoolError::BatchExpired(_) => "batch_expired",
            PoolError::UnsupportedPair(_) => "unsupported_pair",
            PoolError::AmountBelowMinimum { .. } => "amount_below_minimum",
            PoolError::InsufficientReserves { .. } => "insufficient_reserves",
            PoolError::RecipientMismatch => "recipient_mismatch",
            PoolError::MissingOutputCommitment => "missing_output_commitment",
            PoolError::UnknownLeaf(_) => "unknown_leaf",
            PoolError::UnknownOrder(_) => "unknown_order",
            PoolError::NotOrderOwner(_) => "not_order_owner",
            PoolError::DuplicateOrder(_) => "duplicate_order",
            PoolError::BatchFull { .. } => "batch_full",
            PoolError::Custody(_) => "custody",
            PoolError::Overflow => "overflow",
        }
    }

    /// whether re-submitting a fresh proof against the current root could
    /// succeed
    pub fn is_retryable_with_new_proof(&self) -> bool {
        matches!(self, PoolError::StaleRoot(_))
    }
}

pub type Result<T> = std::result::Result<T, PoolError>;
