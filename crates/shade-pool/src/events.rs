//! events emitted on every applied transition
//!
//! sinks must not block: the state machine emits while it still holds the
//! exclusive section.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::clock::Timestamp;
use crate::nullifier::Nullifier;
use crate::tree::MerkleRoot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Deposit,
    Withdraw,
    Trade,
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            EventKind::Deposit => "deposit",
            EventKind::Withdraw => "withdraw",
            EventKind::Trade => "trade",
        })
    }
}

/// public record of a state transition
///
/// carries nothing that links a spend to the deposit it came from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEvent {
    pub kind: EventKind,
    /// leaf of the inserted commitment (deposit, trade)
    pub leaf_index: Option<u64>,
    /// published nullifier (withdraw, trade)
    pub nullifier: Option<Nullifier>,
    /// tree root after the transition
    pub new_root: MerkleRoot,
    pub timestamp: Timestamp,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PoolEvent);
}

/// keeps every event in memory
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<PoolEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &PoolEvent) {
        self.events.lock().push(event.clone());
    }
}

/// writes events to the tracing subscriber
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &PoolEvent) {
        tracing::info!(
            target: "shade_pool::events",
            kind = %event.kind,
            leaf_index = ?event.leaf_index,
            nullifier = ?event.nullifier,
            new_root = %event.new_root,
            timestamp = event.timestamp,
            "pool event"
        );
    }
}

impl EventSink for broadcast::Sender<PoolEvent> {
    fn emit(&self, event: &PoolEvent) {
        // no subscribers is fine
        let _ = self.send(event.clone());
    }
}
