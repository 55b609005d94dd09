//! synthetic clients for local runs
//!
//! a `Workload` plays every user of the pool at once: it funds depositors in
//! the ledger custody, keeps the notes it deposited, and proves withdrawals
//! and trades with the digest verifier's development keys.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use shade_pool::{
    Address, Amount, AssetId, BatchReport, CircuitKind, Deposit, DigestVerifier, LedgerCustody,
    MerkleRoot, Note, OrderId, OrderState, OwnerSecret, Pool, ProofBundle, PublicInputs, Receipt,
    TradingPair, VerifyingKeys, Withdrawal,
};

pub struct Workload {
    keys: VerifyingKeys,
    custody: Arc<LedgerCustody>,
    pair: TradingPair,
    rng: ChaCha20Rng,
    /// deposited and not yet spent
    notes: Vec<Note>,
    /// orders in the open epoch: (order, spent note, output note)
    pending: Vec<(OrderId, Note, Note)>,
}

impl Workload {
    pub fn new(keys: VerifyingKeys, custody: Arc<LedgerCustody>, pair: TradingPair, seed: u64) -> Self {
        Self {
            keys,
            custody,
            pair,
            rng: ChaCha20Rng::seed_from_u64(seed),
            notes: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn unspent(&self) -> usize {
        self.notes.len()
    }

    fn fresh_note(&mut self, amount: Amount, asset: AssetId) -> Note {
        let secret = OwnerSecret::random(&mut self.rng);
        Note::random(amount, asset, secret, &mut self.rng)
    }

    /// fund `who` and deposit a fresh base-asset note
    pub fn deposit(&mut self, pool: &Pool, who: &str, amount: u128) -> Result<Receipt> {
        let note = self.fresh_note(Amount(amount), self.pair.base);
        let depositor = Address::derive(who);
        self.custody.fund(depositor, note.asset, note.amount);

        let receipt = pool
            .deposit(&Deposit {
                commitment: note.commit(),
                amount: note.amount,
                asset: note.asset,
                depositor,
            })
            .with_context(|| format!("deposit of {amount} by {who}"))?;
        self.notes.push(note);
        Ok(receipt)
    }

    /// withdraw a random unspent note in full
    pub fn withdraw(&mut self, pool: &Pool, recipient: &str) -> Result<Receipt> {
        let note = self.take_note()?;
        let recipient = Address::derive(recipient);
        let inputs = PublicInputs {
            root: pool.current_root(),
            nullifier: note.nullifier(),
            target: recipient.into(),
            asset: note.asset,
            amount: note.amount,
            output_commitment: None,
        };
        let proof = DigestVerifier::prove(CircuitKind::Withdraw, &inputs, &self.keys.withdraw);

        pool.withdraw(Withdrawal {
            bundle: ProofBundle::new(inputs, proof),
            recipient,
        })
        .context("withdrawal")
    }

    /// submit a random unspent note as a private order on the pair
    pub fn submit_order(&mut self, pool: &Pool, submitter: &str) -> Result<OrderId> {
        let note = self.take_note()?;
        let output = self.fresh_note(note.amount, note.asset);
        let bundle = self.trade_bundle(&note, &output, pool.current_root());

        match pool.submit_order(Address::derive(submitter), bundle) {
            Ok(id) => {
                self.pending.push((id, note, output));
                Ok(id)
            }
            Err(e) => {
                self.notes.push(note);
                Err(e).context("order submission")
            }
        }
    }

    /// outputs of included orders become spendable, everything else
    /// hands its input note back
    pub fn settle(&mut self, report: &BatchReport) {
        let finished = report.outcomes.iter().chain(&report.expired);
        for outcome in finished {
            let Some(i) = self.pending.iter().position(|(id, _, _)| *id == outcome.order) else {
                continue;
            };
            let (_, input, output) = self.pending.swap_remove(i);
            if outcome.state == OrderState::Included {
                self.notes.push(output);
            } else {
                self.notes.push(input);
            }
        }
    }

    fn trade_bundle(&self, note: &Note, output: &Note, root: MerkleRoot) -> ProofBundle {
        let inputs = PublicInputs {
            root,
            nullifier: note.nullifier(),
            target: self.pair.id().into(),
            asset: note.asset,
            amount: Amount::ZERO,
            output_commitment: Some(output.commit()),
        };
        let proof = DigestVerifier::prove(CircuitKind::Trade, &inputs, &self.keys.trade);
        ProofBundle::new(inputs, proof)
    }

    fn take_note(&mut self) -> Result<Note> {
        if self.notes.is_empty() {
            bail!("no unspent notes left");
        }
        let i = self.rng.gen_range(0..self.notes.len());
        Ok(self.notes.swap_remove(i))
    }
}
