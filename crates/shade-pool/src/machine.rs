//! deposit / withdraw / trade transitions
//!
//! a request moves `Submitted -> Validated -> Verified -> Applied`, or drops
//! to `Rejected` at any step. the stages are split so the pool can run
//! validation and the proof check without the write lock and take it only
//! for `apply_*`, which re-runs the cheap checks before mutating anything.
//!
//! every `apply_*` does all of its fallible work (checks, custody) first;
//! the state mutations that follow cannot fail, so a rejected request
//! leaves `PoolState` exactly as it was.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, Timestamp};
use crate::custody::{Custody, Direction};
use crate::error::{PoolError, Result};
use crate::events::{EventKind, EventSink, PoolEvent};
use crate::note::Commitment;
use crate::nullifier::Nullifier;
use crate::state::PoolState;
use crate::tree::MerkleRoot;
use crate::value::{Address, Amount, AssetId, PairId, TargetId, TradingPair};
use crate::verifier::{CircuitKind, ProofBundle, ProofGate, PublicInputs};

/// monotonically increasing per state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Submitted,
    Validated,
    Verified,
    Applied,
    Rejected,
}

impl core::fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            RequestPhase::Submitted => "submitted",
            RequestPhase::Validated => "validated",
            RequestPhase::Verified => "verified",
            RequestPhase::Applied => "applied",
            RequestPhase::Rejected => "rejected",
        })
    }
}

/// public deposit request; no proof, amount and asset are public
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub commitment: Commitment,
    pub amount: Amount,
    pub asset: AssetId,
    pub depositor: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub bundle: ProofBundle,
    pub recipient: Address,
}

/// outcome of an applied transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub request: RequestId,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullifier: Option<Nullifier>,
    pub new_root: MerkleRoot,
    pub timestamp: Timestamp,
}

impl Receipt {
    pub fn to_event(&self) -> PoolEvent {
        PoolEvent {
            kind: self.kind,
            leaf_index: self.leaf_index,
            nullifier: self.nullifier,
            new_root: self.new_root,
            timestamp: self.timestamp,
        }
    }
}

/// request that passed the cheap checks against some recent state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validated {
    request: RequestId,
    circuit: CircuitKind,
    bundle: ProofBundle,
}

impl Validated {
    pub fn request(&self) -> RequestId {
        self.request
    }

    pub fn circuit(&self) -> CircuitKind {
        self.circuit
    }

    pub fn public_inputs(&self) -> &PublicInputs {
        &self.bundle.public_inputs
    }
}

/// request whose proof was accepted by the gate
///
/// only [`StateMachine::verify`] builds one, so holding it proves the
/// cryptographic check ran on exactly these public inputs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verified {
    inner: Validated,
}

impl Verified {
    pub fn request(&self) -> RequestId {
        self.inner.request
    }

    pub fn circuit(&self) -> CircuitKind {
        self.inner.circuit
    }

    pub fn public_inputs(&self) -> &PublicInputs {
        &self.inner.bundle.public_inputs
    }

    pub fn bundle(&self) -> &ProofBundle {
        &self.inner.bundle
    }
}

/// the transition logic, stateless apart from the request counter
///
/// operates on a `PoolState` passed in by the caller; the caller owns
/// locking
pub struct StateMachine {
    gate: ProofGate,
    custody: Arc<dyn Custody>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    next_request: AtomicU64,
}

impl StateMachine {
    pub fn new(
        gate: ProofGate,
        custody: Arc<dyn Custody>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gate,
            custody,
            events,
            clock,
            next_request: AtomicU64::new(0),
        }
    }

    pub fn gate(&self) -> &ProofGate {
        &self.gate
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn submit(&self, kind: &'static str) -> RequestId {
        let request = RequestId(self.next_request.fetch_add(1, Ordering::Relaxed));
        debug!(%request, kind, phase = %RequestPhase::Submitted, "request");
        request
    }

    fn reject(&self, request: RequestId, err: PoolError) -> PoolError {
        warn!(%request, phase = %RequestPhase::Rejected, reason = err.kind(), "{err}");
        err
    }

    fn applied(&self, receipt: Receipt) -> Receipt {
        info!(
            request = %receipt.request,
            phase = %RequestPhase::Applied,
            kind = %receipt.kind,
            leaf_index = ?receipt.leaf_index,
            root = %receipt.new_root,
            "transition applied"
        );
        self.events.emit(&receipt.to_event());
        receipt
    }

    /// deposit: runs entirely inside the caller's exclusive section
    pub fn deposit(&self, state: &mut PoolState, deposit: &Deposit) -> Result<Receipt> {
        let request = self.submit("deposit");
        self.apply_deposit(request, state, deposit)
            .map_err(|e| self.reject(request, e))
    }

    fn apply_deposit(
        &self,
        request: RequestId,
        state: &mut PoolState,
        deposit: &Deposit,
    ) -> Result<Receipt> {
        let reserve = state
            .reserve(&deposit.asset)
            .ok_or(PoolError::UnsupportedAsset(deposit.asset))?;
        if deposit.amount < state.min_deposit() {
            return Err(PoolError::AmountBelowMinimum {
                amount: deposit.amount,
                minimum: state.min_deposit(),
            });
        }
        if !state.tree().can_insert(1) {
            return Err(PoolError::CapacityExceeded {
                capacity: state.tree().capacity(),
            });
        }
        reserve.checked_add(deposit.amount).ok_or(PoolError::Overflow)?;

        self.custody
            .transfer(deposit.asset, deposit.amount, Direction::In, deposit.depositor)?;

        let (leaf_index, new_root) = state.insert_commitment(deposit.commitment)?;
        state.credit(deposit.asset, deposit.amount)?;

        Ok(self.applied(Receipt {
            request,
            kind: EventKind::Deposit,
            leaf_index: Some(leaf_index),
            nullifier: None,
            new_root,
            timestamp: self.clock.now(),
        }))
    }

    /// cheap checks for a withdrawal; needs only shared access
    pub fn validate_withdraw(&self, state: &PoolState, withdrawal: Withdrawal) -> Result<Validated> {
        let request = self.submit("withdraw");
        self.check_withdraw(state, &withdrawal.bundle.public_inputs, Some(withdrawal.recipient))
            .map_err(|e| self.reject(request, e))?;
        debug!(%request, phase = %RequestPhase::Validated, "withdraw");
        Ok(Validated {
            request,
            circuit: CircuitKind::Withdraw,
            bundle: withdrawal.bundle,
        })
    }

    /// cheap checks for a trade; needs only shared access
    pub fn validate_trade(&self, state: &PoolState, bundle: ProofBundle) -> Result<Validated> {
        let request = self.submit("trade");
        self.check_trade(state, &bundle.public_inputs)
            .map_err(|e| self.reject(request, e))?;
        debug!(%request, phase = %RequestPhase::Validated, "trade");
        Ok(Validated {
            request,
            circuit: CircuitKind::Trade,
            bundle,
        })
    }

    /// the proof check; touches no state and may run without any lock
    pub fn verify(&self, validated: Validated) -> Result<Verified> {
        let inputs = &validated.bundle.public_inputs;
        self.gate
            .verify(validated.circuit, inputs, &validated.bundle.proof_blob)
            .map_err(|e| self.reject(validated.request, e))?;
        debug!(request = %validated.request, phase = %RequestPhase::Verified, circuit = %validated.circuit, "proof accepted");
        Ok(Verified { inner: validated })
    }

    /// re-check and commit a verified withdrawal
    pub fn apply_withdraw(&self, state: &mut PoolState, verified: Verified) -> Result<Receipt> {
        let request = verified.request();
        self.commit_withdraw(state, &verified)
            .map_err(|e| self.reject(request, e))
    }

    fn commit_withdraw(&self, state: &mut PoolState, verified: &Verified) -> Result<Receipt> {
        if verified.circuit() != CircuitKind::Withdraw {
            return Err(PoolError::InvalidProof(CircuitKind::Withdraw));
        }
        let inputs = verified.public_inputs();
        // recipient was bound at validation; the target is the recipient
        let recipient = Address(inputs.target.0);
        self.check_withdraw(state, inputs, None)?;

        self.custody
            .transfer(inputs.asset, inputs.amount, Direction::Out, recipient)?;

        state.spend(inputs.nullifier)?;
        state.debit(inputs.asset, inputs.amount)?;

        Ok(self.applied(Receipt {
            request: verified.request(),
            kind: EventKind::Withdraw,
            leaf_index: None,
            nullifier: Some(inputs.nullifier),
            new_root: state.current_root(),
            timestamp: self.clock.now(),
        }))
    }

    /// re-check and commit a verified trade
    pub fn apply_trade(&self, state: &mut PoolState, verified: Verified) -> Result<Receipt> {
        let request = verified.request();
        self.commit_trade(state, &verified)
            .map_err(|e| self.reject(request, e))
    }

    fn commit_trade(&self, state: &mut PoolState, verified: &Verified) -> Result<Receipt> {
        if verified.circuit() != CircuitKind::Trade {
            return Err(PoolError::InvalidProof(CircuitKind::Trade));
        }
        let inputs = verified.public_inputs();
        let output = self.check_trade(state, inputs)?;

        state.spend(inputs.nullifier)?;
        let (leaf_index, new_root) = state.insert_commitment(output)?;

        Ok(self.applied(Receipt {
            request: verified.request(),
            kind: EventKind::Trade,
            leaf_index: Some(leaf_index),
            nullifier: Some(inputs.nullifier),
            new_root,
            timestamp: self.clock.now(),
        }))
    }

    /// validate, verify and apply against one exclusively held state
    pub fn withdraw(&self, state: &mut PoolState, withdrawal: Withdrawal) -> Result<Receipt> {
        let validated = self.validate_withdraw(state, withdrawal)?;
        let verified = self.verify(validated)?;
        self.apply_withdraw(state, verified)
    }

    /// validate, verify and apply against one exclusively held state
    pub fn trade(&self, state: &mut PoolState, bundle: ProofBundle) -> Result<Receipt> {
        let validated = self.validate_trade(state, bundle)?;
        let verified = self.verify(validated)?;
        self.apply_trade(state, verified)
    }

    fn check_withdraw(
        &self,
        state: &PoolState,
        inputs: &PublicInputs,
        recipient: Option<Address>,
    ) -> Result<()> {
        if let Some(recipient) = recipient {
            if TargetId::from(recipient) != inputs.target {
                return Err(PoolError::RecipientMismatch);
            }
        }
        let available = state
            .reserve(&inputs.asset)
            .ok_or(PoolError::UnsupportedAsset(inputs.asset))?;
        self.gate.precheck(state, inputs)?;
        if available < inputs.amount {
            return Err(PoolError::InsufficientReserves {
                asset: inputs.asset,
                available,
                requested: inputs.amount,
            });
        }
        Ok(())
    }

    /// returns the output commitment to insert
    fn check_trade(&self, state: &PoolState, inputs: &PublicInputs) -> Result<Commitment> {
        let pair_id = PairId(inputs.target.0);
        let pair: &TradingPair = state
            .pair(&pair_id)
            .ok_or(PoolError::UnsupportedPair(pair_id))?;
        if inputs.asset != pair.base && inputs.asset != pair.quote {
            return Err(PoolError::UnsupportedAsset(inputs.asset));
        }
        let output = inputs
            .output_commitment
            .ok_or(PoolError::MissingOutputCommitment)?;
        self.gate.precheck(state, inputs)?;
        if !state.tree().can_insert(1) {
            return Err(PoolError::CapacityExceeded {
                capacity: state.tree().capacity(),
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::custody::{CustodyError, LedgerCustody};
    use crate::events::EventLog;
    use crate::verifier::{DigestVerifier, VerifyingKeys};

    struct Harness {
        machine: StateMachine,
        custody: Arc<LedgerCustody>,
        events: Arc<EventLog>,
        state: PoolState,
        keys: VerifyingKeys,
    }

    fn dot() -> AssetId {
        AssetId::derive("DOT")
    }

    fn usdc() -> AssetId {
        AssetId::derive("USDC")
    }

    fn harness(depth: u8) -> Harness {
        let keys = VerifyingKeys::development();
        let custody = Arc::new(LedgerCustody::new());
        let events = Arc::new(EventLog::new());
        let machine = StateMachine::new(
            ProofGate::new(Arc::new(DigestVerifier), keys.clone()),
            custody.clone(),
            events.clone(),
            Arc::new(ManualClock::new(1_000)),
        );
        let state = PoolState::new(depth, 8)
            .unwrap()
            .with_pair(TradingPair::new(dot(), usdc()));
        Harness { machine, custody, events, state, keys }
    }

    fn deposit(h: &mut Harness, who: &str, amount: u128, commitment: Commitment) -> Receipt {
        let depositor = Address::derive(who);
        h.custody.fund(depositor, dot(), Amount(amount));
        h.machine
            .deposit(
                &mut h.state,
                &Deposit { commitment, amount: Amount(amount), asset: dot(), depositor },
            )
            .unwrap()
    }

    fn withdrawal(h: &Harness, nf: u8, amount: u128, recipient: Address) -> Withdrawal {
        let inputs = PublicInputs {
            root: h.state.current_root(),
            nullifier: Nullifier([nf; 32]),
            target: recipient.into(),
            asset: dot(),
            amount: Amount(amount),
            output_commitment: None,
        };
        let proof = DigestVerifier::prove(CircuitKind::Withdraw, &inputs, &h.keys.withdraw);
        Withdrawal { bundle: ProofBundle::new(inputs, proof), recipient }
    }

    fn trade(h: &Harness, nf: u8, output: Commitment) -> ProofBundle {
        let inputs = PublicInputs {
            root: h.state.current_root(),
            nullifier: Nullifier([nf; 32]),
            target: TradingPair::new(dot(), usdc()).id().into(),
            asset: dot(),
            amount: Amount::ZERO,
            output_commitment: Some(output),
        };
        let proof = DigestVerifier::prove(CircuitKind::Trade, &inputs, &h.keys.trade);
        ProofBundle::new(inputs, proof)
    }

    /// takes deposits, cannot pay out
    struct PayoutOutage;

    impl Custody for PayoutOutage {
        fn transfer(
            &self,
            _: AssetId,
            _: Amount,
            direction: Direction,
            _: Address,
        ) -> std::result::Result<(), CustodyError> {
            match direction {
                Direction::In => Ok(()),
                Direction::Out => Err(CustodyError::Unavailable("payout rail down".into())),
            }
        }
    }

    #[test]
    fn test_custody_outage_rejects_withdrawal() {
        let mut h = harness(4);
        deposit(&mut h, "alice", 100, Commitment([1u8; 32]));
        let request = withdrawal(&h, 7, 60, Address::derive("bob"));

        let events = Arc::new(EventLog::new());
        let machine = StateMachine::new(
            ProofGate::new(Arc::new(DigestVerifier), h.keys.clone()),
            Arc::new(PayoutOutage),
            events.clone(),
            Arc::new(ManualClock::new(2_000)),
        );
        let before = h.state.clone();
        let fingerprint = h.state.fingerprint();

        assert_eq!(
            machine.withdraw(&mut h.state, request.clone()),
            Err(PoolError::Custody(CustodyError::Unavailable("payout rail down".into())))
        );
        assert!(!h.state.is_spent(&Nullifier([7u8; 32])));
        assert_eq!(h.state.reserve(&dot()), Some(Amount(100)));
        assert_eq!(h.state, before);
        assert_eq!(h.state.fingerprint(), fingerprint);
        assert!(events.is_empty());

        // same request goes through once custody is back
        h.machine.withdraw(&mut h.state, request).unwrap();
        assert!(h.state.is_spent(&Nullifier([7u8; 32])));
    }

    #[test]
    fn test_deposit_inserts_and_credits() {
        let mut h = harness(4);
        let receipt = deposit(&mut h, "alice", 50, Commitment([1u8; 32]));
        assert_eq!(receipt.leaf_index, Some(0));
        assert_eq!(receipt.new_root, h.state.current_root());
        assert_eq!(receipt.timestamp, 1_000);
        assert_eq!(h.state.reserve(&dot()), Some(Amount(50)));
        assert_eq!(h.custody.balance(&Address::derive("alice"), &dot()), Amount::ZERO);
        assert_eq!(h.events.len(), 1);
    }

    #[test]
    fn test_deposit_rejections_leave_state() {
        let mut h = harness(4);
        let before = h.state.clone();
        let alice = Address::derive("alice");

        let bad_asset = Deposit {
            commitment: Commitment([1u8; 32]),
            amount: Amount(5),
            asset: AssetId::derive("XYZ"),
            depositor: alice,
        };
        assert_eq!(
            h.machine.deposit(&mut h.state, &bad_asset),
            Err(PoolError::UnsupportedAsset(AssetId::derive("XYZ")))
        );

        let zero = Deposit { amount: Amount::ZERO, asset: dot(), ..bad_asset.clone() };
        assert!(matches!(
            h.machine.deposit(&mut h.state, &zero),
            Err(PoolError::AmountBelowMinimum { .. })
        ));

        // unfunded depositor: custody refuses, tree untouched
        let unfunded = Deposit { asset: dot(), ..bad_asset };
        assert!(matches!(
            h.machine.deposit(&mut h.state, &unfunded),
            Err(PoolError::Custody(_))
        ));

        assert_eq!(h.state, before);
        assert!(h.events.is_empty());
    }

    #[test]
    fn test_withdraw_then_replay() {
        let mut h = harness(4);
        deposit(&mut h, "alice", 100, Commitment([1u8; 32]));
        let bob = Address::derive("bob");

        let w = withdrawal(&h, 7, 40, bob);
        let receipt = h.machine.withdraw(&mut h.state, w.clone()).unwrap();
        assert_eq!(receipt.nullifier, Some(Nullifier([7u8; 32])));
        assert_eq!(h.state.reserve(&dot()), Some(Amount(60)));
        assert_eq!(h.custody.balance(&bob, &dot()), Amount(40));

        let before = h.state.clone();
        assert_eq!(
            h.machine.withdraw(&mut h.state, w),
            Err(PoolError::DoubleSpend(Nullifier([7u8; 32])))
        );
        assert_eq!(h.state, before);
    }

    #[test]
    fn test_withdraw_recipient_must_match() {
        let mut h = harness(4);
        deposit(&mut h, "alice", 100, Commitment([1u8; 32]));
        let mut w = withdrawal(&h, 7, 40, Address::derive("bob"));
        w.recipient = Address::derive("mallory");
        assert_eq!(h.machine.withdraw(&mut h.state, w), Err(PoolError::RecipientMismatch));
    }

    #[test]
    fn test_withdraw_bad_proof_and_reserves() {
        let mut h = harness(4);
        deposit(&mut h, "alice", 100, Commitment([1u8; 32]));
        let bob = Address::derive("bob");

        let mut w = withdrawal(&h, 7, 40, bob);
        w.bundle.proof_blob[0] ^= 1;
        assert_eq!(
            h.machine.withdraw(&mut h.state, w),
            Err(PoolError::InvalidProof(CircuitKind::Withdraw))
        );

        let w = withdrawal(&h, 8, 101, bob);
        assert!(matches!(
            h.machine.withdraw(&mut h.state, w),
            Err(PoolError::InsufficientReserves { .. })
        ));
        assert!(h.state.nullifiers().is_empty());
    }

    #[test]
    fn test_stale_root_rejected_before_proof() {
        let mut h = harness(4);
        let mut w = withdrawal(&h, 7, 1, Address::derive("bob"));
        w.bundle.public_inputs.root = MerkleRoot([0xee; 32]);
        // blob is garbage too; the root check wins
        w.bundle.proof_blob = vec![0u8; 3];
        assert_eq!(
            h.machine.withdraw(&mut h.state, w),
            Err(PoolError::StaleRoot(MerkleRoot([0xee; 32])))
        );
    }

    #[test]
    fn test_trade_spends_and_inserts() {
        let mut h = harness(4);
        deposit(&mut h, "alice", 100, Commitment([1u8; 32]));
        let before_reserve = h.state.reserve(&dot());

        let bundle = trade(&h, 9, Commitment([2u8; 32]));
        let receipt = h.machine.trade(&mut h.state, bundle).unwrap();
        assert_eq!(receipt.leaf_index, Some(1));
        assert!(h.state.is_spent(&Nullifier([9u8; 32])));
        assert_eq!(h.state.tree().leaf(1), Some(Commitment([2u8; 32])));
        assert_eq!(h.state.reserve(&dot()), before_reserve);
    }

    #[test]
    fn test_trade_rejections() {
        let mut h = harness(1);
        deposit(&mut h, "alice", 10, Commitment([1u8; 32]));

        let mut no_output = trade(&h, 9, Commitment([2u8; 32]));
        no_output.public_inputs.output_commitment = None;
        assert_eq!(
            h.machine.trade(&mut h.state, no_output),
            Err(PoolError::MissingOutputCommitment)
        );

        let mut bad_pair = trade(&h, 9, Commitment([2u8; 32]));
        bad_pair.public_inputs.target = TargetId([3u8; 32]);
        assert_eq!(
            h.machine.trade(&mut h.state, bad_pair),
            Err(PoolError::UnsupportedPair(PairId([3u8; 32])))
        );

        // fill the depth-1 tree, then a trade cannot land its output
        deposit(&mut h, "carol", 10, Commitment([3u8; 32]));
        let before = h.state.clone();
        let bundle = trade(&h, 9, Commitment([4u8; 32]));
        assert_eq!(
            h.machine.trade(&mut h.state, bundle),
            Err(PoolError::CapacityExceeded { capacity: 2 })
        );
        assert!(!h.state.is_spent(&Nullifier([9u8; 32])));
        assert_eq!(h.state, before);
    }

    #[test]
    fn test_token_circuit_must_match() {
        let mut h = harness(4);
        deposit(&mut h, "alice", 100, Commitment([1u8; 32]));
        let validated = h
            .machine
            .validate_trade(&h.state, trade(&h, 9, Commitment([2u8; 32])))
            .unwrap();
        let verified = h.machine.verify(validated).unwrap();
        assert_eq!(
            h.machine.apply_withdraw(&mut h.state, verified),
            Err(PoolError::InvalidProof(CircuitKind::Withdraw))
        );
    }

    #[test]
    fn test_apply_rechecks_after_interleaving() {
        let mut h = harness(4);
        deposit(&mut h, "alice", 100, Commitment([1u8; 32]));
        let bob = Address::derive("bob");

        // two requests for the same nullifier validated against the same state
        let first = h.machine.validate_withdraw(&h.state, withdrawal(&h, 5, 10, bob)).unwrap();
        let second = h.machine.validate_withdraw(&h.state, withdrawal(&h, 5, 10, bob)).unwrap();
        assert!(second.request() > first.request());
        let first = h.machine.verify(first).unwrap();
        let second = h.machine.verify(second).unwrap();

        h.machine.apply_withdraw(&mut h.state, first).unwrap();
        assert_eq!(
            h.machine.apply_withdraw(&mut h.state, second),
            Err(PoolError::DoubleSpend(Nullifier([5u8; 32])))
        );
        assert_eq!(h.state.reserve(&dot()), Some(Amount(90)));
    }
}
