//! shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use shade_pool::{
    Address, Amount, AssetId, BatchConfig, CircuitKind, Collaborators, Deposit, DigestVerifier,
    EventLog, FixedBeacon, LedgerCustody, ManualClock, MerkleRoot, Note, OwnerSecret, Pool,
    PoolState, ProofBundle, PublicInputs, Receipt, TradingPair, VerifyingKeys, Withdrawal,
};

pub const START: u64 = 1_700_000_000_000;

pub fn dot() -> AssetId {
    AssetId::derive("DOT")
}

pub fn usdc() -> AssetId {
    AssetId::derive("USDC")
}

pub fn pair() -> TradingPair {
    TradingPair::new(dot(), usdc())
}

pub struct Fixture {
    pub pool: Pool,
    pub custody: Arc<LedgerCustody>,
    pub events: Arc<EventLog>,
    pub clock: Arc<ManualClock>,
    pub keys: VerifyingKeys,
    pub rng: ChaCha20Rng,
}

impl Fixture {
    pub fn new(depth: u8) -> Self {
        Self::with_batch(depth, 16, BatchConfig::default())
    }

    pub fn with_batch(depth: u8, root_history: usize, batch: BatchConfig) -> Self {
        let keys = VerifyingKeys::development();
        let custody = Arc::new(LedgerCustody::new());
        let events = Arc::new(EventLog::new());
        let clock = Arc::new(ManualClock::new(START));
        let state = PoolState::new(depth, root_history)
            .expect("valid depth")
            .with_pair(pair());

        let pool = Pool::new(
            state,
            keys.clone(),
            batch,
            Collaborators {
                verifier: Arc::new(DigestVerifier),
                custody: custody.clone(),
                events: events.clone(),
                clock: clock.clone(),
                beacon: Arc::new(FixedBeacon([0x5e; 32])),
            },
        );

        Self {
            pool,
            custody,
            events,
            clock,
            keys,
            rng: ChaCha20Rng::seed_from_u64(0x5eed),
        }
    }

    pub fn note(&mut self, amount: u128) -> Note {
        let secret = OwnerSecret::random(&mut self.rng);
        Note::random(Amount(amount), dot(), secret, &mut self.rng)
    }

    /// fund `who` and deposit a fresh note of `amount` DOT
    pub fn deposit(&mut self, who: &str, amount: u128) -> (Note, Receipt) {
        let note = self.note(amount);
        let receipt = self.deposit_note(who, &note).expect("deposit");
        (note, receipt)
    }

    pub fn deposit_note(&self, who: &str, note: &Note) -> shade_pool::Result<Receipt> {
        let depositor = Address::derive(who);
        self.custody.fund(depositor, note.asset, note.amount);
        self.pool.deposit(&Deposit {
            commitment: note.commit(),
            amount: note.amount,
            asset: note.asset,
            depositor,
        })
    }

    /// withdrawal of `amount` from `note` to `recipient`, proven against `root`
    pub fn withdrawal(&self, note: &Note, amount: u128, recipient: &str, root: MerkleRoot) -> Withdrawal {
        let recipient = Address::derive(recipient);
        let inputs = PublicInputs {
            root,
            nullifier: note.nullifier(),
            target: recipient.into(),
            asset: note.asset,
            amount: Amount(amount),
            output_commitment: None,
        };
        let proof = DigestVerifier::prove(CircuitKind::Withdraw, &inputs, &self.keys.withdraw);
        Withdrawal {
            bundle: ProofBundle::new(inputs, proof),
            recipient,
        }
    }

    /// trade of `note` on the DOT/USDC pair into `output`, proven against `root`
    pub fn trade(&self, note: &Note, output: &Note, root: MerkleRoot) -> ProofBundle {
        let inputs = PublicInputs {
            root,
            nullifier: note.nullifier(),
            target: pair().id().into(),
            asset: note.asset,
            amount: Amount::ZERO,
            output_commitment: Some(output.commit()),
        };
        let proof = DigestVerifier::prove(CircuitKind::Trade, &inputs, &self.keys.trade);
        ProofBundle::new(inputs, proof)
    }
}
