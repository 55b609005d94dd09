//! concurrent pool handle
//!
//! `Pool` owns the single `PoolState` behind a `RwLock` and the order book
//! behind a `Mutex`.
//!
//! - reads take the shared lock
//! - withdraw / trade / order submission validate under the shared lock,
//!   verify the proof with no lock held, then take the exclusive lock to
//!   re-check and apply
//! - deposits check and apply under the exclusive lock
//! - batch close holds the book and then the state for the whole close
//!
//! lock order is always book -> state.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::batch::{BatchReport, OrderBook, OrderId, OrderOutcome};
use crate::beacon::RandomnessBeacon;
use crate::clock::Clock;
use crate::config::{BatchConfig, ConfigError, PoolConfig};
use crate::custody::Custody;
use crate::error::Result;
use crate::events::EventSink;
use crate::hash::Hash;
use crate::machine::{Deposit, Receipt, StateMachine, Withdrawal};
use crate::nullifier::Nullifier;
use crate::state::{PoolState, PoolStatus};
use crate::tree::{MerkleProof, MerkleRoot};
use crate::value::{Address, Amount, AssetId};
use crate::verifier::{ProofBundle, ProofGate, ProofVerifier, VerifyingKeys};

/// external services the pool talks to
#[derive(Clone)]
pub struct Collaborators {
    pub verifier: Arc<dyn ProofVerifier>,
    pub custody: Arc<dyn Custody>,
    pub events: Arc<dyn EventSink>,
    pub clock: Arc<dyn Clock>,
    pub beacon: Arc<dyn RandomnessBeacon>,
}

pub struct Pool {
    state: RwLock<PoolState>,
    machine: StateMachine,
    book: Mutex<OrderBook>,
    beacon: Arc<dyn RandomnessBeacon>,
}

impl Pool {
    pub fn new(
        state: PoolState,
        keys: VerifyingKeys,
        batch: BatchConfig,
        collaborators: Collaborators,
    ) -> Self {
        let Collaborators {
            verifier,
            custody,
            events,
            clock,
            beacon,
        } = collaborators;
        let book = OrderBook::new(batch, clock.now());
        let machine = StateMachine::new(ProofGate::new(verifier, keys), custody, events, clock);
        Self {
            state: RwLock::new(state),
            machine,
            book: Mutex::new(book),
            beacon,
        }
    }

    pub fn from_config(
        config: &PoolConfig,
        collaborators: Collaborators,
    ) -> std::result::Result<Self, ConfigError> {
        let state = PoolState::from_config(config)?;
        let keys = config.keys.verifying_keys()?;
        info!(
            depth = config.tree_depth,
            root_history = config.root_history,
            assets = config.assets.len(),
            pairs = config.pairs.len(),
            "pool initialised"
        );
        Ok(Self::new(state, keys, config.batch.clone(), collaborators))
    }

    pub fn current_root(&self) -> MerkleRoot {
        self.state.read().current_root()
    }

    pub fn is_recent_root(&self, root: &MerkleRoot) -> bool {
        self.state.read().is_recent_root(root)
    }

    pub fn is_spent(&self, nullifier: &Nullifier) -> bool {
        self.state.read().is_spent(nullifier)
    }

    pub fn reserve(&self, asset: &AssetId) -> Option<Amount> {
        self.state.read().reserve(asset)
    }

    pub fn prove_membership(&self, leaf_index: u64) -> Result<MerkleProof> {
        self.state.read().prove_membership(leaf_index)
    }

    pub fn fingerprint(&self) -> Hash {
        self.state.read().fingerprint()
    }

    pub fn status(&self) -> PoolStatus {
        self.state.read().status()
    }

    /// consistent copy of the whole state
    pub fn snapshot(&self) -> PoolState {
        self.state.read().clone()
    }

    pub fn deposit(&self, deposit: &Deposit) -> Result<Receipt> {
        let mut state = self.state.write();
        self.machine.deposit(&mut state, deposit)
    }

    pub fn withdraw(&self, withdrawal: Withdrawal) -> Result<Receipt> {
        let validated = {
            let state = self.state.read();
            self.machine.validate_withdraw(&state, withdrawal)?
        };
        let verified = self.machine.verify(validated)?;
        let mut state = self.state.write();
        self.machine.apply_withdraw(&mut state, verified)
    }

    /// immediate trade, bypassing the order book
    pub fn trade(&self, bundle: ProofBundle) -> Result<Receipt> {
        let validated = {
            let state = self.state.read();
            self.machine.validate_trade(&state, bundle)?
        };
        let verified = self.machine.verify(validated)?;
        let mut state = self.state.write();
        self.machine.apply_trade(&mut state, verified)
    }

    /// queue a trade for the open epoch; the proof is checked here
    pub fn submit_order(&self, submitter: Address, bundle: ProofBundle) -> Result<OrderId> {
        let validated = {
            let state = self.state.read();
            self.machine.validate_trade(&state, bundle)?
        };
        let verified = self.machine.verify(validated)?;
        let now = self.machine.clock().now();
        self.book.lock().submit(submitter, verified, now)
    }

    pub fn withdraw_order(&self, id: OrderId, submitter: &Address) -> Result<()> {
        self.book.lock().withdraw(id, submitter).map(|_| ())
    }

    pub fn pending_orders(&self) -> usize {
        self.book.lock().pending_len()
    }

    pub fn epoch(&self) -> u64 {
        self.book.lock().epoch()
    }

    pub fn should_close(&self) -> bool {
        let now = self.machine.clock().now();
        self.book.lock().should_close(now)
    }

    /// drop aged orders without closing the epoch
    pub fn expire_orders(&self) -> Vec<OrderOutcome> {
        let now = self.machine.clock().now();
        self.book.lock().expire(now)
    }

    /// close the open epoch; submissions and trades wait until it is done
    pub fn close_batch(&self) -> BatchReport {
        let mut book = self.book.lock();
        let mut state = self.state.write();
        let now = self.machine.clock().now();
        book.close(&mut state, &self.machine, self.beacon.as_ref(), now)
    }

    /// close only if the epoch trigger fired
    pub fn close_if_due(&self) -> Option<BatchReport> {
        let mut book = self.book.lock();
        let now = self.machine.clock().now();
        if !book.should_close(now) {
            return None;
        }
        let mut state = self.state.write();
        Some(book.close(&mut state, &self.machine, self.beacon.as_ref(), now))
    }
}
