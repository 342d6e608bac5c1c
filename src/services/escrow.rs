//! Escrow custody: the value locked against one bet.
//!
//! These functions only compute the new custody state and the ledger legs
//! that must accompany it. The caller applies both in one transaction, so
//! a failed transfer never leaves a balance changed.

use crate::error::{BetError, BetResult};
use crate::ledger::Movement;
use crate::models::{Bet, Custody, Identity};

/// Empty custody entry for a freshly created bet
pub fn open(bet_id: u64) -> Custody {
    Custody { bet_id, balance: 0 }
}

/// Lock `amount` from `from` into custody.
///
/// Returns the debit leg the ledger must perform for the deposit to count.
pub fn deposit(custody: &mut Custody, from: Identity, amount: u64) -> BetResult<Movement> {
    if amount == 0 {
        return Err(BetError::InvalidTerms("Deposit must be greater than zero".into()));
    }
    custody.balance = custody
        .balance
        .checked_add(amount)
        .ok_or(BetError::ArithmeticOverflow)?;
    Ok(Movement::Debit { from, amount })
}

/// Drain the whole balance to `destination` and consume the entry.
///
/// Taking the custody by value makes a second withdrawal impossible.
pub(crate) fn withdraw_all_and_close(custody: Custody, destination: Identity) -> Movement {
    Movement::Credit {
        to: destination,
        amount: custody.balance,
    }
}

/// Balance the custody entry must hold in the bet's current phase
pub fn expected_balance(bet: &Bet) -> u64 {
    if bet.accepted {
        bet.total_stake()
    } else {
        bet.terms.creator_stake
    }
}

/// Reject a custody entry that drifted from its bet
pub fn verify(bet: &Bet, custody: &Custody) -> BetResult<()> {
    let expected = expected_balance(bet);
    if custody.bet_id != bet.id || custody.balance != expected {
        return Err(BetError::Storage(format!(
            "Custody for bet {} holds {}, expected {}",
            bet.id, custody.balance, expected
        )));
    }
    Ok(())
}
