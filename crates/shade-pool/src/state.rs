//! pool state
//!
//! everything a transition reads or writes, in one value. no public
//! mutators: only the state machine changes it, and only from inside the
//! pool's exclusive section.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, PoolConfig};
use crate::error::PoolError;
use crate::hash::Hash;
use crate::note::Commitment;
use crate::nullifier::{Nullifier, NullifierRegistry};
use crate::tree::{CommitmentTree, MerkleProof, MerkleRoot};
use crate::value::{Amount, AssetId, PairId, TradingPair};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolState {
    tree: CommitmentTree,
    nullifiers: NullifierRegistry,
    /// keys are exactly the registered assets
    reserves: BTreeMap<AssetId, Amount>,
    pairs: BTreeMap<PairId, TradingPair>,
    min_deposit: Amount,
}

/// point-in-time summary, cheap to serialize
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    pub root: MerkleRoot,
    pub leaves: u64,
    pub capacity: u64,
    pub spent_nullifiers: usize,
    pub reserves: BTreeMap<AssetId, Amount>,
    pub pairs: usize,
}

impl PoolState {
    /// empty pool with no assets registered
    pub fn new(tree_depth: u8, root_history: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            tree: CommitmentTree::new(tree_depth, root_history)?,
            nullifiers: NullifierRegistry::new(),
            reserves: BTreeMap::new(),
            pairs: BTreeMap::new(),
            min_deposit: Amount(1),
        })
    }

    pub fn from_config(config: &PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut state = Self::new(config.tree_depth, config.root_history)?
            .with_min_deposit(config.min_deposit_amount());
        for asset in config.asset_ids() {
            state = state.with_asset(asset);
        }
        for pair in config.trading_pairs() {
            state = state.with_pair(pair);
        }
        Ok(state)
    }

    /// register an asset with an empty reserve
    pub fn with_asset(mut self, asset: AssetId) -> Self {
        self.reserves.entry(asset).or_default();
        self
    }

    /// register a trading pair (and both of its assets)
    pub fn with_pair(mut self, pair: TradingPair) -> Self {
        self.reserves.entry(pair.base).or_default();
        self.reserves.entry(pair.quote).or_default();
        self.pairs.insert(pair.id(), pair);
        self
    }

    /// zero is treated as one: empty deposits are never accepted
    pub fn with_min_deposit(mut self, min_deposit: Amount) -> Self {
        self.min_deposit = min_deposit.max(Amount(1));
        self
    }

    pub fn current_root(&self) -> MerkleRoot {
        self.tree.current_root()
    }

    pub fn is_recent_root(&self, root: &MerkleRoot) -> bool {
        self.tree.is_recent_root(root)
    }

    pub fn is_spent(&self, nullifier: &Nullifier) -> bool {
        self.nullifiers.is_spent(nullifier)
    }

    /// reserve of a registered asset
    pub fn reserve(&self, asset: &AssetId) -> Option<Amount> {
        self.reserves.get(asset).copied()
    }

    pub fn is_supported(&self, asset: &AssetId) -> bool {
        self.reserves.contains_key(asset)
    }

    pub fn pair(&self, id: &PairId) -> Option<&TradingPair> {
        self.pairs.get(id)
    }

    pub fn min_deposit(&self) -> Amount {
        self.min_deposit
    }

    pub fn tree(&self) -> &CommitmentTree {
        &self.tree
    }

    pub fn nullifiers(&self) -> &NullifierRegistry {
        &self.nullifiers
    }

    pub fn prove_membership(&self, leaf_index: u64) -> Result<MerkleProof, PoolError> {
        self.tree.prove_membership(leaf_index)
    }

    /// digest of everything observable: root, spent set, reserves
    pub fn fingerprint(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.tree.current_root().0);
        hasher.update(&self.tree.len().to_le_bytes());
        for nf in self.nullifiers.sorted() {
            hasher.update(&nf.0);
        }
        for (asset, amount) in &self.reserves {
            hasher.update(&asset.0);
            hasher.update(&amount.to_le_bytes());
        }
        *hasher.finalize().as_bytes()
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            root: self.tree.current_root(),
            leaves: self.tree.len(),
            capacity: self.tree.capacity(),
            spent_nullifiers: self.nullifiers.len(),
            reserves: self.reserves.clone(),
            pairs: self.pairs.len(),
        }
    }

    pub(crate) fn insert_commitment(
        &mut self,
        commitment: Commitment,
    ) -> Result<(u64, MerkleRoot), PoolError> {
        self.tree.insert(commitment)
    }

    pub(crate) fn spend(&mut self, nullifier: Nullifier) -> Result<(), PoolError> {
        self.nullifiers.spend(nullifier)
    }

    pub(crate) fn credit(&mut self, asset: AssetId, amount: Amount) -> Result<(), PoolError> {
        let reserve = self
            .reserves
            .get_mut(&asset)
            .ok_or(PoolError::UnsupportedAsset(asset))?;
        *reserve = reserve.checked_add(amount).ok_or(PoolError::Overflow)?;
        Ok(())
    }

    pub(crate) fn debit(&mut self, asset: AssetId, amount: Amount) -> Result<(), PoolError> {
        let reserve = self
            .reserves
            .get_mut(&asset)
            .ok_or(PoolError::UnsupportedAsset(asset))?;
        *reserve = reserve
            .checked_sub(amount)
            .ok_or(PoolError::InsufficientReserves {
                asset,
                available: *reserve,
                requested: amount,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot() -> AssetId {
        AssetId::derive("DOT")
    }

    #[test]
    fn test_from_default_config() {
        let state = PoolState::from_config(&PoolConfig::default()).unwrap();
        assert!(state.is_supported(&dot()));
        assert!(state.is_supported(&AssetId::derive("USDC")));
        assert!(!state.is_supported(&AssetId::NATIVE));
        let pair = TradingPair::new(dot(), AssetId::derive("USDC"));
        assert_eq!(state.pair(&pair.id()), Some(&pair));
        assert_eq!(state.tree().depth(), 20);
    }

    #[test]
    fn test_credit_debit() {
        let mut state = PoolState::new(4, 4).unwrap().with_asset(dot());
        state.credit(dot(), Amount(10)).unwrap();
        state.debit(dot(), Amount(4)).unwrap();
        assert_eq!(state.reserve(&dot()), Some(Amount(6)));

        assert_eq!(
            state.debit(dot(), Amount(7)),
            Err(PoolError::InsufficientReserves {
                asset: dot(),
                available: Amount(6),
                requested: Amount(7),
            })
        );
        assert_eq!(state.reserve(&dot()), Some(Amount(6)));

        let other = AssetId::derive("X");
        assert_eq!(state.credit(other, Amount(1)), Err(PoolError::UnsupportedAsset(other)));

        state.credit(dot(), Amount(u128::MAX - 6)).unwrap();
        assert_eq!(state.credit(dot(), Amount(1)), Err(PoolError::Overflow));
    }

    #[test]
    fn test_fingerprint_tracks_mutations() {
        let mut state = PoolState::new(4, 4).unwrap().with_asset(dot());
        let empty = state.fingerprint();
        assert_eq!(empty, state.clone().fingerprint());

        state.insert_commitment(Commitment([1u8; 32])).unwrap();
        let after_insert = state.fingerprint();
        assert_ne!(after_insert, empty);

        state.spend(Nullifier([1u8; 32])).unwrap();
        assert_ne!(state.fingerprint(), after_insert);

        let before_credit = state.fingerprint();
        state.credit(dot(), Amount(1)).unwrap();
        assert_ne!(state.fingerprint(), before_credit);
    }

    #[test]
    fn test_min_deposit_floor() {
        let state = PoolState::new(2, 0).unwrap().with_min_deposit(Amount::ZERO);
        assert_eq!(state.min_deposit(), Amount(1));
    }

    #[test]
    fn test_status() {
        let mut state = PoolState::new(3, 1).unwrap().with_asset(dot());
        state.insert_commitment(Commitment([2u8; 32])).unwrap();
        let status = state.status();
        assert_eq!(status.leaves, 1);
        assert_eq!(status.capacity, 8);
        assert_eq!(status.root, state.current_root());
        assert_eq!(status.reserves.get(&dot()), Some(&Amount::ZERO));
    }
}
