//! value types for the pool
//!
//! assets, amounts, counterparties and trading pairs

use serde::{Deserialize, Serialize};

use crate::hash::hash_newtype;
use crate::{ASSET_DOMAIN, PAIR_DOMAIN};

hash_newtype!(
    /// asset identifier (32 bytes, derived from the asset symbol)
    AssetId
);

impl AssetId {
    /// native token asset id
    pub const NATIVE: Self = Self([0u8; 32]);

    /// derive asset id from its symbol
    pub fn derive(symbol: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(ASSET_DOMAIN);
        hasher.update(symbol.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

hash_newtype!(
    /// external counterparty (depositor, withdrawal recipient, order submitter)
    Address
);

impl Address {
    /// deterministic address from a label, for tooling and tests
    pub fn derive(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }
}

hash_newtype!(
    /// trading pair identifier
    PairId
);

hash_newtype!(
    /// the `vault_or_pair_id` public input: a recipient address for
    /// withdrawals, a pair id for trades
    TargetId
);

impl From<Address> for TargetId {
    fn from(address: Address) -> Self {
        Self(address.0)
    }
}

impl From<PairId> for TargetId {
    fn from(pair: PairId) -> Self {
        Self(pair.0)
    }
}

/// amount (u128 to match substrate-style balances)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(amount: u128) -> Self {
        Self(amount)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn to_le_bytes(&self) -> [u8; 16] {
        self.0.to_le_bytes()
    }
}

impl From<u128> for Amount {
    fn from(v: u128) -> Self {
        Self(v)
    }
}

impl From<u64> for Amount {
    fn from(v: u64) -> Self {
        Self(v as u128)
    }
}

impl From<Amount> for u128 {
    fn from(v: Amount) -> Self {
        v.0
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// a registered market for shielded swaps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: AssetId,
    pub quote: AssetId,
}

impl TradingPair {
    pub fn new(base: AssetId, quote: AssetId) -> Self {
        Self { base, quote }
    }

    /// pair id committed to by trade proofs (ordered: base/quote != quote/base)
    pub fn id(&self) -> PairId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(PAIR_DOMAIN);
        hasher.update(&self.base.0);
        hasher.update(&self.quote.0);
        PairId(*hasher.finalize().as_bytes())
    }
}
