//! Value movement between identities and escrow.
//!
//! The real ledger is an external collaborator; the escrow only needs a
//! way to move a batch of value atomically. `InMemoryLedger` backs the
//! binary and the tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::error::{AppError, AppResult, BetError, BetResult};
use crate::models::Identity;

/// One leg of a value transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Movement {
    /// Value leaving an identity into escrow
    Debit { from: Identity, amount: u64 },
    /// Value leaving escrow to an identity
    Credit { to: Identity, amount: u64 },
}

impl Movement {
    /// Movement that undoes this one
    pub fn inverse(&self) -> Movement {
        match *self {
            Movement::Debit { from, amount } => Movement::Credit { to: from, amount },
            Movement::Credit { to, amount } => Movement::Debit { from: to, amount },
        }
    }
}

/// Source and sink of value for escrow operations
pub trait Ledger: Send {
    /// Spendable balance of an identity
    fn balance(&self, identity: &Identity) -> u64;

    /// Apply every movement or none of them.
    ///
    /// Fails with `TransferFailure` if any leg cannot be performed.
    fn apply(&mut self, movements: &[Movement]) -> BetResult<()>;
}

/// Ledger held entirely in memory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: BTreeMap<Identity, u64>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger seeded with opening balances
    pub fn with_balances<I>(balances: I) -> Self
    where
        I: IntoIterator<Item = (Identity, u64)>,
    {
        Self {
            balances: balances.into_iter().collect(),
        }
    }

    /// Opening balances from a JSON object mapping base58 identities to amounts
    pub fn from_seed_json(json: &str) -> AppResult<Self> {
        let balances: BTreeMap<Identity, u64> = serde_json::from_str(json)
            .map_err(|e| AppError::Config(format!("Invalid ledger seed: {}", e)))?;
        Ok(Self { balances })
    }

    pub fn load_seed(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let ledger = Self::from_seed_json(&json)?;
        info!(
            "Ledger seeded from {:?}: {} accounts, {} total",
            path,
            ledger.balances.len(),
            ledger.total_supply()
        );
        Ok(ledger)
    }

    /// Sum of all balances held by identities
    pub fn total_supply(&self) -> u128 {
        self.balances.values().map(|b| *b as u128).sum()
    }
}

impl Ledger for InMemoryLedger {
    fn balance(&self, identity: &Identity) -> u64 {
        self.balances.get(identity).copied().unwrap_or(0)
    }

    fn apply(&mut self, movements: &[Movement]) -> BetResult<()> {
        // Stage on a scratch copy so a failing leg leaves balances untouched
        let mut staged: BTreeMap<Identity, u64> = BTreeMap::new();

        for movement in movements {
            match *movement {
                Movement::Debit { from, amount } => {
                    let balance = staged.entry(from).or_insert_with(|| self.balance(&from));
                    let available = *balance;
                    *balance = available.checked_sub(amount).ok_or_else(|| {
                        BetError::TransferFailure(format!(
                            "{} has insufficient balance: available {}, required {}",
                            from, available, amount
                        ))
                    })?;
                }
                Movement::Credit { to, amount } => {
                    let balance = staged.entry(to).or_insert_with(|| self.balance(&to));
                    let current = *balance;
                    *balance = current.checked_add(amount).ok_or_else(|| {
                        BetError::TransferFailure(format!("Balance of {} would overflow", to))
                    })?;
                }
            }
        }

        self.balances.extend(staged);
        Ok(())
    }
}
