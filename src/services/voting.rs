//! Vote accumulation and resolution rules.
//!
//! Player votes resolve a bet only when both parties name the same
//! outcome. Resolver votes resolve it once one outcome holds a strict
//! majority of the full group size fixed at creation. The two tallies never
//! mix, and both paths stay open side by side until one of them resolves
//! the bet.

use serde::Serialize;

use crate::auth;
use crate::error::{BetError, BetResult};
use crate::models::{Bet, Identity, Outcome};

/// What an accepted vote did to the bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "winner", rename_all = "snake_case")]
pub enum VoteEffect {
    /// Vote stored, bet still unresolved
    Recorded,
    /// Vote stored and it settled the winner
    Resolved(Outcome),
}

/// Votes needed out of a group of `group_size`: `floor(N/2) + 1`
pub fn majority_threshold(group_size: usize) -> usize {
    group_size / 2 + 1
}

fn require_voting_open(bet: &Bet) -> BetResult<()> {
    if !bet.accepted {
        return Err(BetError::NotAccepted);
    }
    if bet.voting.is_resolved() {
        return Err(BetError::AlreadyResolved);
    }
    Ok(())
}

/// Record the vote of the creator or the challenger
pub fn cast_player_vote(bet: &mut Bet, voter: &Identity, outcome: Outcome) -> BetResult<VoteEffect> {
    require_voting_open(bet)?;
    let seat = auth::player_seat(bet, voter)?;
    bet.voting.record_player_vote(seat, outcome)?;

    match (bet.voting.creator_vote(), bet.voting.challenger_vote()) {
        (Some(creator_vote), Some(challenger_vote)) if creator_vote == challenger_vote => {
            bet.voting.finalize(creator_vote)?;
            Ok(VoteEffect::Resolved(creator_vote))
        }
        _ => Ok(VoteEffect::Recorded),
    }
}

/// Record the vote of a resolver-group member
pub fn cast_resolver_vote(bet: &mut Bet, voter: &Identity, outcome: Outcome) -> BetResult<VoteEffect> {
    require_voting_open(bet)?;
    let position = auth::resolver_seat(bet, voter)?;
    bet.voting.record_resolver_vote(position, outcome)?;

    let threshold = majority_threshold(bet.terms.resolver_group.len());
    let tally = bet.voting.resolver_tally();

    match Outcome::ALL.into_iter().find(|o| tally[o.index()] >= threshold) {
        Some(winner) => {
            bet.voting.finalize(winner)?;
            Ok(VoteEffect::Resolved(winner))
        }
        None => Ok(VoteEffect::Recorded),
    }
}

/// No remaining vote can resolve the bet.
///
/// True when the players disagree and no outcome can still reach the
/// resolver majority, e.g. an even group split down the middle. Nothing
/// breaks the tie automatically.
pub fn is_deadlocked(bet: &Bet) -> bool {
    if bet.voting.is_resolved() || !bet.voting.players_disagree() {
        return false;
    }

    let group_size = bet.terms.resolver_group.len();
    let remaining = group_size - bet.voting.resolver_votes_cast();
    let threshold = majority_threshold(group_size);
    let tally = bet.voting.resolver_tally();

    Outcome::ALL
        .iter()
        .all(|o| tally[o.index()] + remaining < threshold)
}
