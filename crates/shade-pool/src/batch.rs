//! batched private orders
//!
//! trades submitted as private orders are held until their epoch closes,
//! then executed in an order nobody could predict at submission time:
//!
//! 1. expire orders older than `max_order_age_ms`
//! 2. fix the batch: digest = blake3(domain ‖ epoch ‖ order ids)
//! 3. reveal beacon randomness bound to that digest
//! 4. seed = blake3(domain ‖ beacon ‖ epoch ‖ order ids), ChaCha20 keyed by it
//! 5. fisher-yates shuffle, then run each order through the trade transition
//!
//! proofs are checked at submission, outside the exclusive section; close
//! only re-runs the cheap checks.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info};

use crate::beacon::RandomnessBeacon;
use crate::clock::Timestamp;
use crate::config::BatchConfig;
use crate::error::{PoolError, Result};
use crate::hash::Hash;
use crate::machine::{Receipt, StateMachine, Verified};
use crate::nullifier::Nullifier;
use crate::state::PoolState;
use crate::value::{Address, PairId};
use crate::verifier::{CircuitKind, ProofBundle};
use crate::BATCH_DOMAIN;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "order#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Pending,
    Included,
    Rejected,
    Expired,
}

/// a verified trade waiting for its batch
#[derive(Clone, Debug)]
pub struct PrivateOrder {
    id: OrderId,
    submitter: Address,
    submitted_at: Timestamp,
    state: OrderState,
    verified: Verified,
}

impl PrivateOrder {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn submitter(&self) -> Address {
        self.submitter
    }

    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn pair(&self) -> PairId {
        PairId(self.verified.public_inputs().target.0)
    }

    pub fn nullifier(&self) -> Nullifier {
        self.verified.public_inputs().nullifier
    }

    pub fn bundle(&self) -> &ProofBundle {
        self.verified.bundle()
    }
}

/// what happened to one order at close
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderOutcome {
    pub order: OrderId,
    pub submitter: Address,
    pub state: OrderState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "error_message")]
    pub error: Option<PoolError>,
}

impl OrderOutcome {
    fn expired(order: &PrivateOrder) -> Self {
        Self {
            order: order.id,
            submitter: order.submitter,
            state: OrderState::Expired,
            receipt: None,
            error: Some(PoolError::BatchExpired(order.id)),
        }
    }
}

fn error_message<S: Serializer>(error: &Option<PoolError>, serializer: S) -> core::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

fn hex_hash<S: Serializer>(hash: &Hash, serializer: S) -> core::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(hash))
}

/// result of closing one epoch
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub epoch: u64,
    pub closed_at: Timestamp,
    #[serde(serialize_with = "hex_hash")]
    pub seed: Hash,
    /// executed orders, in execution order
    pub outcomes: Vec<OrderOutcome>,
    /// orders dropped for age, in submission order
    pub expired: Vec<OrderOutcome>,
}

impl BatchReport {
    pub fn included(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == OrderState::Included)
            .count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == OrderState::Rejected)
            .count()
    }
}

/// pending orders of the open epoch
#[derive(Debug)]
pub struct OrderBook {
    config: BatchConfig,
    epoch: u64,
    opened_at: Timestamp,
    next_order: u64,
    /// submission order
    pending: Vec<PrivateOrder>,
}

impl OrderBook {
    pub fn new(config: BatchConfig, now: Timestamp) -> Self {
        Self {
            config,
            epoch: 0,
            opened_at: now,
            next_order: 0,
            pending: Vec::new(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> &[PrivateOrder] {
        &self.pending
    }

    /// queue a verified trade for the open epoch
    ///
    /// a full epoch refuses further orders until it closes, so one batch
    /// never moves the root more than `max_orders` times
    pub fn submit(&mut self, submitter: Address, verified: Verified, now: Timestamp) -> Result<OrderId> {
        if verified.circuit() != CircuitKind::Trade {
            return Err(PoolError::InvalidProof(CircuitKind::Trade));
        }
        if self.pending.len() >= self.config.max_orders {
            return Err(PoolError::BatchFull {
                max_orders: self.config.max_orders,
            });
        }
        let nullifier = verified.public_inputs().nullifier;
        if self.pending.iter().any(|o| o.nullifier() == nullifier) {
            return Err(PoolError::DuplicateOrder(nullifier));
        }

        let id = OrderId(self.next_order);
        self.next_order += 1;
        self.pending.push(PrivateOrder {
            id,
            submitter,
            submitted_at: now,
            state: OrderState::Pending,
            verified,
        });
        debug!(order = %id, epoch = self.epoch, pending = self.pending.len(), "order queued");
        Ok(id)
    }

    /// pull a pending order before its batch closes
    pub fn withdraw(&mut self, id: OrderId, submitter: &Address) -> Result<PrivateOrder> {
        let position = self
            .pending
            .iter()
            .position(|o| o.id == id)
            .ok_or(PoolError::UnknownOrder(id))?;
        if self.pending[position].submitter != *submitter {
            return Err(PoolError::NotOrderOwner(id));
        }
        let order = self.pending.remove(position);
        debug!(order = %id, "order withdrawn");
        Ok(order)
    }

    /// max_orders pending, or the epoch has run its course
    pub fn should_close(&self, now: Timestamp) -> bool {
        self.pending.len() >= self.config.max_orders
            || now.saturating_sub(self.opened_at) >= self.config.epoch_ms
    }

    /// drop orders older than max_order_age_ms
    pub fn expire(&mut self, now: Timestamp) -> Vec<OrderOutcome> {
        let max_age = self.config.max_order_age_ms;
        let (stale, fresh): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|o| now.saturating_sub(o.submitted_at) > max_age);
        self.pending = fresh;

        stale
            .into_iter()
            .map(|order| {
                debug!(order = %order.id, "order expired");
                OrderOutcome::expired(&order)
            })
            .collect()
    }

    /// execute the open epoch and open the next one
    ///
    /// the caller holds the state exclusively for the whole call
    pub fn close(
        &mut self,
        state: &mut PoolState,
        machine: &StateMachine,
        beacon: &dyn RandomnessBeacon,
        now: Timestamp,
    ) -> BatchReport {
        let expired = self.expire(now);
        let mut orders = std::mem::take(&mut self.pending);
        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();

        let digest = batch_digest(self.epoch, &ids);
        let randomness = beacon.reveal(self.epoch, &digest);
        let seed = shuffle_seed(&randomness, self.epoch, &ids);
        shuffle(&mut orders, seed);

        let outcomes: Vec<OrderOutcome> = orders
            .into_iter()
            .map(|order| {
                let (order_id, submitter) = (order.id, order.submitter);
                match machine.apply_trade(state, order.verified) {
                    Ok(receipt) => OrderOutcome {
                        order: order_id,
                        submitter,
                        state: OrderState::Included,
                        receipt: Some(receipt),
                        error: None,
                    },
                    Err(error) => OrderOutcome {
                        order: order_id,
                        submitter,
                        state: OrderState::Rejected,
                        receipt: None,
                        error: Some(error),
                    },
                }
            })
            .collect();

        let report = BatchReport {
            epoch: self.epoch,
            closed_at: now,
            seed,
            outcomes,
            expired,
        };
        info!(
            epoch = report.epoch,
            included = report.included(),
            rejected = report.rejected(),
            expired = report.expired.len(),
            root = %state.current_root(),
            "batch closed"
        );

        self.epoch += 1;
        self.opened_at = now;
        report
    }
}

/// commitment to the batch contents, handed to the beacon
pub fn batch_digest(epoch: u64, ids: &[OrderId]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(BATCH_DOMAIN);
    hasher.update(b"digest");
    hasher.update(&epoch.to_le_bytes());
    for id in ids {
        hasher.update(&id.0.to_le_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// chacha seed for the execution order
pub fn shuffle_seed(beacon: &Hash, epoch: u64, ids: &[OrderId]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(BATCH_DOMAIN);
    hasher.update(beacon);
    hasher.update(&epoch.to_le_bytes());
    for id in ids {
        hasher.update(&id.0.to_le_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// fisher-yates under ChaCha20 keyed by `seed`
pub fn shuffle<T>(items: &mut [T], seed: Hash) {
    let mut rng = ChaCha20Rng::from_seed(seed);
    items.shuffle(&mut rng);
}
