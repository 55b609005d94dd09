//! end-to-end flows through the pool handle

mod common;

use common::{dot, Fixture};
use shade_pool::{
    Address, Amount, BatchConfig, EventKind, MerkleRoot, Note, PoolError,
};

#[test]
fn test_depth_two_scenario() {
    // capacity 4, window of one superseded root
    let mut fx = Fixture::with_batch(2, 1, BatchConfig { max_orders: 1, ..BatchConfig::default() });

    let (a, _) = fx.deposit("alice", 100);
    let (b, _) = fx.deposit("bob", 50);
    let (c, _) = fx.deposit("carol", 25);
    let r1 = fx.pool.current_root();
    assert_eq!(fx.pool.reserve(&dot()), Some(Amount(175)));

    // withdraw A against R1
    let withdraw_a = fx.withdrawal(&a, 100, "dave", r1);
    fx.pool.withdraw(withdraw_a.clone()).unwrap();
    assert_eq!(fx.pool.reserve(&dot()), Some(Amount(75)));
    assert!(fx.pool.is_spent(&a.nullifier()));

    // identical proof again
    assert_eq!(
        fx.pool.withdraw(withdraw_a),
        Err(PoolError::DoubleSpend(a.nullifier()))
    );

    // D moves the root to R2; R1 is still inside the window
    let (d, receipt) = fx.deposit("erin", 10);
    let r2 = fx.pool.current_root();
    assert_ne!(r1, r2);
    assert_eq!(receipt.new_root, r2);
    assert_eq!(receipt.leaf_index, Some(3));

    fx.pool.withdraw(fx.withdrawal(&b, 50, "dave", r1)).unwrap();
    assert!(fx.pool.is_spent(&b.nullifier()));

    // tree is full now
    let e = fx.note(5);
    assert_eq!(
        fx.deposit_note("frank", &e),
        Err(PoolError::CapacityExceeded { capacity: 4 })
    );

    // membership proofs still verify against the final root
    for (i, note) in [&a, &b, &c, &d].into_iter().enumerate() {
        let proof = fx.pool.prove_membership(i as u64).unwrap();
        assert!(proof.verify(&note.commit(), &r2));
    }
}

#[test]
fn test_stale_root_after_window() {
    // same shape with no history: only the current root is accepted
    let mut fx = Fixture::with_batch(2, 0, BatchConfig::default());

    let (a, _) = fx.deposit("alice", 100);
    let (b, _) = fx.deposit("bob", 50);
    fx.deposit("carol", 25);
    let r1 = fx.pool.current_root();
    fx.deposit("erin", 10);

    let before = fx.pool.snapshot();
    assert_eq!(
        fx.pool.withdraw(fx.withdrawal(&b, 50, "dave", r1)),
        Err(PoolError::StaleRoot(r1))
    );
    assert_eq!(fx.pool.snapshot(), before);

    // re-proving against the current root works
    let r2 = fx.pool.current_root();
    fx.pool.withdraw(fx.withdrawal(&a, 100, "dave", r2)).unwrap();
}

#[test]
fn test_window_slides() {
    let mut fx = Fixture::with_batch(4, 2, BatchConfig::default());
    let (a, _) = fx.deposit("alice", 10);
    let r1 = fx.pool.current_root();

    fx.deposit("bob", 10);
    fx.deposit("carol", 10);
    assert!(fx.pool.is_recent_root(&r1));

    fx.deposit("dave", 10);
    assert!(!fx.pool.is_recent_root(&r1));

    let err = fx.pool.withdraw(fx.withdrawal(&a, 10, "erin", r1)).unwrap_err();
    assert!(err.is_retryable_with_new_proof());
}

#[test]
fn test_round_trip() {
    let mut fx = Fixture::new(8);
    fx.deposit("bob", 500);
    let (note, _) = fx.deposit("alice", 300);
    let reserve = fx.pool.reserve(&dot()).unwrap();

    let root = fx.pool.current_root();
    let receipt = fx.pool.withdraw(fx.withdrawal(&note, 300, "carol", root)).unwrap();

    assert_eq!(fx.pool.reserve(&dot()), reserve.checked_sub(Amount(300)));
    assert!(fx.pool.is_spent(&note.nullifier()));
    assert_eq!(receipt.nullifier, Some(note.nullifier()));
    assert_eq!(fx.custody.balance(&Address::derive("carol"), &dot()), Amount(300));

    assert_eq!(
        fx.pool.withdraw(fx.withdrawal(&note, 300, "carol", root)),
        Err(PoolError::DoubleSpend(note.nullifier()))
    );
}

#[test]
fn test_rejections_leave_state_unchanged() {
    let mut fx = Fixture::with_batch(1, 4, BatchConfig::default());
    let (a, _) = fx.deposit("alice", 100);
    let root = fx.pool.current_root();
    fx.pool.withdraw(fx.withdrawal(&a, 40, "bob", root)).unwrap();
    fx.deposit("carol", 10);

    let snapshot = fx.pool.snapshot();
    let fingerprint = fx.pool.fingerprint();
    let events = fx.events.len();
    let root = fx.pool.current_root();
    let fresh = fx.note(10);

    // invalid proof
    let mut forged = fx.withdrawal(&fresh, 10, "mallory", root);
    forged.bundle.proof_blob = vec![0u8; 32];
    assert!(matches!(fx.pool.withdraw(forged), Err(PoolError::InvalidProof(_))));

    // stale root
    let stale = fx.withdrawal(&fresh, 10, "mallory", MerkleRoot([9u8; 32]));
    assert!(matches!(fx.pool.withdraw(stale), Err(PoolError::StaleRoot(_))));

    // double spend
    let replay = fx.withdrawal(&a, 40, "bob", root);
    assert!(matches!(fx.pool.withdraw(replay), Err(PoolError::DoubleSpend(_))));

    // depth 1 holds two leaves
    let output = fx.note(10);
    let trade = fx.trade(&fresh, &output, root);
    assert!(matches!(fx.pool.trade(trade), Err(PoolError::CapacityExceeded { .. })));
    let late = Note::random(Amount(1), dot(), fresh.owner_secret, &mut fx.rng);
    assert!(matches!(
        fx.deposit_note("dave", &late),
        Err(PoolError::CapacityExceeded { .. })
    ));

    assert_eq!(fx.pool.snapshot(), snapshot);
    assert_eq!(fx.pool.fingerprint(), fingerprint);
    assert_eq!(fx.events.len(), events);
}

#[test]
fn test_events_do_not_link_spends_to_deposits() {
    let mut fx = Fixture::new(6);
    let (note, _) = fx.deposit("alice", 100);
    let root = fx.pool.current_root();
    let output = fx.note(100);

    fx.pool.trade(fx.trade(&note, &output, root)).unwrap();
    let root = fx.pool.current_root();
    fx.pool.withdraw(fx.withdrawal(&output, 100, "bob", root)).unwrap();

    let events = fx.events.events();
    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Deposit, EventKind::Trade, EventKind::Withdraw]);

    // deposit: leaf only; trade: leaf of the new note plus nullifier; withdraw: nullifier only
    assert_eq!(events[0].leaf_index, Some(0));
    assert!(events[0].nullifier.is_none());
    assert_eq!(events[1].leaf_index, Some(1));
    assert_eq!(events[1].nullifier, Some(note.nullifier()));
    assert!(events[2].leaf_index.is_none());
    assert_eq!(events[2].nullifier, Some(output.nullifier()));
    assert!(events.iter().all(|e| e.timestamp == common::START));
}
