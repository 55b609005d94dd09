//! custody of the underlying public funds
//!
//! the pool never moves tokens itself; it asks a [`Custody`] backend (a
//! pallet, a bridge contract, a test ledger) to pull funds in on deposit and
//! release them on withdrawal. the state machine calls it after every check
//! has passed and before any state is mutated.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{Address, Amount, AssetId};

/// direction of a custody transfer, seen from the pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// counterparty -> pool (deposit)
    In,
    /// pool -> counterparty (withdraw)
    Out,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("{account} holds {available} of {asset}, {requested} requested")]
    InsufficientFunds {
        account: Address,
        asset: AssetId,
        available: Amount,
        requested: Amount,
    },

    #[error("custody backend unavailable: {0}")]
    Unavailable(String),
}

/// external token custody
pub trait Custody: Send + Sync {
    fn transfer(
        &self,
        asset: AssetId,
        amount: Amount,
        direction: Direction,
        counterparty: Address,
    ) -> Result<(), CustodyError>;
}

/// one transfer recorded by [`LedgerCustody`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub asset: AssetId,
    pub amount: Amount,
    pub direction: Direction,
    pub counterparty: Address,
}

#[derive(Debug, Default)]
struct Ledger {
    /// public balances of external accounts
    balances: HashMap<(Address, AssetId), Amount>,
    transfers: Vec<Transfer>,
}

/// in-memory custody: external accounts hold public balances that move in
/// and out of the pool
#[derive(Debug, Default)]
pub struct LedgerCustody {
    ledger: Mutex<Ledger>,
}

impl LedgerCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// credit an external account (faucet)
    pub fn fund(&self, account: Address, asset: AssetId, amount: Amount) {
        let mut ledger = self.ledger.lock();
        let balance = ledger.balances.entry((account, asset)).or_default();
        *balance = Amount(balance.0.saturating_add(amount.0));
    }

    pub fn balance(&self, account: &Address, asset: &AssetId) -> Amount {
        self.ledger
            .lock()
            .balances
            .get(&(*account, *asset))
            .copied()
            .unwrap_or_default()
    }

    /// every successful transfer, in order
    pub fn transfers(&self) -> Vec<Transfer> {
        self.ledger.lock().transfers.clone()
    }
}

impl Custody for LedgerCustody {
    fn transfer(
        &self,
        asset: AssetId,
        amount: Amount,
        direction: Direction,
        counterparty: Address,
    ) -> Result<(), CustodyError> {
        let mut ledger = self.ledger.lock();
        let balance = ledger.balances.entry((counterparty, asset)).or_default();

        match direction {
            Direction::In => {
                *balance = balance.checked_sub(amount).ok_or(CustodyError::InsufficientFunds {
                    account: counterparty,
                    asset,
                    available: *balance,
                    requested: amount,
                })?;
            }
            Direction::Out => {
                *balance = Amount(balance.0.saturating_add(amount.0));
            }
        }

        ledger.transfers.push(Transfer {
            asset,
            amount,
            direction,
            counterparty,
        });
        Ok(())
    }
}
