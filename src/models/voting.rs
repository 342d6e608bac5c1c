use serde::{Deserialize, Serialize};

use crate::error::{BetError, BetResult};
use crate::models::Outcome;

/// Which of the two staking parties a vote belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSeat {
    Creator,
    Challenger,
}

/// Votes embedded in a bet record.
///
/// Every slot moves from unset to a value at most once, and `winner` is
/// set exactly when `resolved` is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingState {
    creator_vote: Option<Outcome>,
    challenger_vote: Option<Outcome>,
    /// Positionally aligned with the bet's resolver group
    resolver_votes: Vec<Option<Outcome>>,
    resolved: bool,
    winner: Option<Outcome>,
}

impl VotingState {
    pub fn new(resolver_count: usize) -> Self {
        Self {
            creator_vote: None,
            challenger_vote: None,
            resolver_votes: vec![None; resolver_count],
            resolved: false,
            winner: None,
        }
    }

    pub fn creator_vote(&self) -> Option<Outcome> {
        self.creator_vote
    }

    pub fn challenger_vote(&self) -> Option<Outcome> {
        self.challenger_vote
    }

    pub fn resolver_votes(&self) -> &[Option<Outcome>] {
        &self.resolver_votes
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn winner(&self) -> Option<Outcome> {
        self.winner
    }

    /// Both players voted and named different outcomes
    pub fn players_disagree(&self) -> bool {
        matches!(
            (self.creator_vote, self.challenger_vote),
            (Some(a), Some(b)) if a != b
        )
    }

    /// Resolver votes per outcome, indexed by `Outcome::index`
    pub fn resolver_tally(&self) -> [usize; 2] {
        let mut tally = [0usize; 2];
        for vote in self.resolver_votes.iter().flatten() {
            tally[vote.index()] += 1;
        }
        tally
    }

    pub fn resolver_votes_cast(&self) -> usize {
        self.resolver_votes.iter().filter(|v| v.is_some()).count()
    }

    pub(crate) fn record_player_vote(&mut self, seat: PlayerSeat, outcome: Outcome) -> BetResult<()> {
        let slot = match seat {
            PlayerSeat::Creator => &mut self.creator_vote,
            PlayerSeat::Challenger => &mut self.challenger_vote,
        };
        if slot.is_some() {
            return Err(BetError::AlreadyVoted);
        }
        *slot = Some(outcome);
        Ok(())
    }

    pub(crate) fn record_resolver_vote(&mut self, position: usize, outcome: Outcome) -> BetResult<()> {
        let slot = self
            .resolver_votes
            .get_mut(position)
            .ok_or_else(|| BetError::Unauthorized("Not a member of the resolver group".into()))?;
        if slot.is_some() {
            return Err(BetError::AlreadyVoted);
        }
        *slot = Some(outcome);
        Ok(())
    }

    pub(crate) fn finalize(&mut self, winner: Outcome) -> BetResult<()> {
        if self.resolved {
            return Err(BetError::AlreadyResolved);
        }
        self.resolved = true;
        self.winner = Some(winner);
        Ok(())
    }
}
