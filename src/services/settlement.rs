use serde::Serialize;

use crate::auth;
use crate::error::{BetError, BetResult};
use crate::ledger::Movement;
use crate::models::{Bet, Custody, Identity, Outcome};
use crate::services::escrow;

/// Result of a successful claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimReceipt {
    pub bet_id: u64,
    pub outcome: Outcome,
    pub winner: Identity,
    pub payout: u64,
    pub creator: Identity,
    pub record_refund: u64,
}

/// Result of a creator withdrawing an unaccepted offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelReceipt {
    pub bet_id: u64,
    pub creator: Identity,
    pub stake_refund: u64,
    pub record_refund: u64,
}

/// Ledger legs and receipt for closing a bet record
#[derive(Debug, Clone)]
pub struct Closure<R> {
    pub receipt: R,
    pub movements: Vec<Movement>,
}

fn record_refund(bet: &Bet) -> Option<Movement> {
    (bet.record_deposit > 0).then(|| Movement::Credit {
        to: *bet.creator(),
        amount: bet.record_deposit,
    })
}

/// Pay the pot to the winner and return the record deposit to the creator.
///
/// The creator gets the deposit back whoever won: it paid for the record.
pub fn settle_claim(bet: &Bet, custody: Custody, caller: &Identity) -> BetResult<Closure<ClaimReceipt>> {
    if !bet.voting.is_resolved() {
        return Err(BetError::NotResolved);
    }
    let outcome = auth::require_winner(bet, caller)?;
    escrow::verify(bet, &custody)?;

    let payout = custody.balance();
    let mut movements = vec![escrow::withdraw_all_and_close(custody, *caller)];
    movements.extend(record_refund(bet));

    Ok(Closure {
        receipt: ClaimReceipt {
            bet_id: bet.id,
            outcome,
            winner: *caller,
            payout,
            creator: *bet.creator(),
            record_refund: bet.record_deposit,
        },
        movements,
    })
}

/// Refund stake and record deposit of an offer nobody accepted
pub fn settle_cancel(bet: &Bet, custody: Custody, caller: &Identity) -> BetResult<Closure<CancelReceipt>> {
    if bet.accepted {
        return Err(BetError::AlreadyAccepted);
    }
    auth::require_creator(bet, caller)?;
    escrow::verify(bet, &custody)?;

    let stake_refund = custody.balance();
    let mut movements = vec![escrow::withdraw_all_and_close(custody, *caller)];
    movements.extend(record_refund(bet));

    Ok(Closure {
        receipt: CancelReceipt {
            bet_id: bet.id,
            creator: *caller,
            stake_refund,
            record_refund: bet.record_deposit,
        },
        movements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BetTerms;

    fn id(n: u8) -> Identity {
        Identity::new([n; 32])
    }

    fn bet_with_custody(accepted: bool) -> (Bet, Custody) {
        let mut bet = Bet::new(
            5,
            BetTerms {
                creator: id(1),
                challenger: id(2),
                resolver_group: vec![id(10)],
                creator_stake: 300,
                challenger_stake: 200,
                deadline: 1_000,
            },
            1_100,
            0,
        );
        let mut custody = escrow::open(5);
        escrow::deposit(&mut custody, id(1), 300).unwrap();
        if accepted {
            bet.accepted = true;
            escrow::deposit(&mut custody, id(2), 200).unwrap();
        }
        (bet, custody)
    }

    #[test]
    fn test_claim_requires_resolution() {
        let (bet, custody) = bet_with_custody(true);
        assert!(matches!(
            settle_claim(&bet, custody, &id(1)),
            Err(BetError::NotResolved)
        ));
    }

    #[test]
    fn test_claim_pays_winner_and_refunds_creator() {
        let (mut bet, custody) = bet_with_custody(true);
        bet.voting.finalize(Outcome::ChallengerWins).unwrap();

        let closure = settle_claim(&bet, custody, &id(2)).unwrap();
        assert_eq!(closure.receipt.payout, 500);
        assert_eq!(closure.receipt.record_refund, 1_100);
        assert_eq!(
            closure.movements,
            vec![
                Movement::Credit { to: id(2), amount: 500 },
                Movement::Credit { to: id(1), amount: 1_100 },
            ]
        );
    }

    #[test]
    fn test_claim_by_loser_rejected() {
        let (mut bet, custody) = bet_with_custody(true);
        bet.voting.finalize(Outcome::ChallengerWins).unwrap();
        assert!(matches!(
            settle_claim(&bet, custody, &id(1)),
            Err(BetError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_cancel_only_before_acceptance() {
        let (bet, custody) = bet_with_custody(false);
        let closure = settle_cancel(&bet, custody.clone(), &id(1)).unwrap();
        assert_eq!(closure.receipt.stake_refund, 300);
        assert!(matches!(
            settle_cancel(&bet, custody, &id(2)),
            Err(BetError::Unauthorized(_))
        ));

        let (accepted, custody) = bet_with_custody(true);
        assert_eq!(
            settle_cancel(&accepted, custody, &id(1)).unwrap_err(),
            BetError::AlreadyAccepted
        );
    }
}
