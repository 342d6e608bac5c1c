//! Authorization guard.
//!
//! Callers arrive already authenticated; these checks only decide whether
//! the identity holds the role an operation needs in the bet's current
//! phase. They never mutate anything.

use crate::error::{BetError, BetResult};
use crate::models::{Bet, Identity, Outcome, PlayerSeat};

/// Role an operation requires from its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Creator,
    Challenger,
    Player,
    Resolver,
    Winner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Creator => "creator",
            Role::Challenger => "challenger",
            Role::Player => "player",
            Role::Resolver => "resolver",
            Role::Winner => "winner",
        }
    }
}

fn denied(caller: &Identity, role: Role, bet: &Bet) -> BetError {
    BetError::Unauthorized(format!(
        "{} is not the {} of bet {}",
        caller,
        role.as_str(),
        bet.id
    ))
}

pub fn require_creator(bet: &Bet, caller: &Identity) -> BetResult<()> {
    if caller != bet.creator() {
        return Err(denied(caller, Role::Creator, bet));
    }
    Ok(())
}

pub fn require_challenger(bet: &Bet, caller: &Identity) -> BetResult<()> {
    if caller != bet.challenger() {
        return Err(denied(caller, Role::Challenger, bet));
    }
    Ok(())
}

/// Seat of a staking party, or `Unauthorized` for anyone else
pub fn player_seat(bet: &Bet, caller: &Identity) -> BetResult<PlayerSeat> {
    if caller == bet.creator() {
        Ok(PlayerSeat::Creator)
    } else if caller == bet.challenger() {
        Ok(PlayerSeat::Challenger)
    } else {
        Err(denied(caller, Role::Player, bet))
    }
}

/// Position of the caller in the resolver group
pub fn resolver_seat(bet: &Bet, caller: &Identity) -> BetResult<usize> {
    bet.resolver_position(caller)
        .ok_or_else(|| denied(caller, Role::Resolver, bet))
}

/// Winning outcome, provided the caller is the party it pays
pub fn require_winner(bet: &Bet, caller: &Identity) -> BetResult<Outcome> {
    let winner = bet.voting.winner().ok_or(BetError::NotResolved)?;
    if caller != bet.beneficiary(winner) {
        return Err(denied(caller, Role::Winner, bet));
    }
    Ok(winner)
}
