use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{BetError, BetResult};
use crate::models::{Identity, Outcome, VotingState};

/// Lifecycle phase of a bet, derived from its flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetPhase {
    /// Created, waiting for the challenger
    Open,
    /// Both stakes locked, voting in progress
    Active,
    /// Winner determined, waiting for the claim
    Resolved,
}

impl BetPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetPhase::Open => "open",
            BetPhase::Active => "active",
            BetPhase::Resolved => "resolved",
        }
    }
}

/// Terms fixed at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetTerms {
    pub creator: Identity,
    pub challenger: Identity,
    pub resolver_group: Vec<Identity>,
    pub creator_stake: u64,
    pub challenger_stake: u64,
    /// UNIX timestamp
    pub deadline: i64,
}

impl BetTerms {
    /// Validate the shape of the terms before anything is allocated
    pub fn validate(&self, max_resolvers: usize, now: i64) -> BetResult<()> {
        if self.creator == self.challenger {
            return Err(BetError::InvalidTerms("Creator cannot challenge themselves".into()));
        }
        if self.creator_stake == 0 || self.challenger_stake == 0 {
            return Err(BetError::InvalidTerms("Stakes must be greater than zero".into()));
        }
        if self.creator_stake.checked_add(self.challenger_stake).is_none() {
            return Err(BetError::InvalidTerms("Combined stake overflows".into()));
        }
        if self.resolver_group.is_empty() {
            return Err(BetError::InvalidTerms("Resolver group cannot be empty".into()));
        }
        if self.resolver_group.len() > max_resolvers {
            return Err(BetError::InvalidTerms(format!(
                "Resolver group exceeds {} members",
                max_resolvers
            )));
        }

        let mut seen = HashSet::with_capacity(self.resolver_group.len());
        for resolver in &self.resolver_group {
            if *resolver == self.creator || *resolver == self.challenger {
                return Err(BetError::InvalidTerms(format!(
                    "Resolver {} is a party to the bet",
                    resolver
                )));
            }
            if !seen.insert(*resolver) {
                return Err(BetError::InvalidTerms(format!("Duplicate resolver {}", resolver)));
            }
        }

        if self.deadline <= now {
            return Err(BetError::InvalidTerms("Deadline must be in the future".into()));
        }

        Ok(())
    }
}

/// Durable record of a single wager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub id: u64,
    pub terms: BetTerms,
    pub accepted: bool,
    /// Paid by the creator at creation, returned to the creator on close
    pub record_deposit: u64,
    pub created_at: i64,
    pub voting: VotingState,
}

impl Bet {
    pub fn new(id: u64, terms: BetTerms, record_deposit: u64, created_at: i64) -> Self {
        let voting = VotingState::new(terms.resolver_group.len());
        Self {
            id,
            terms,
            accepted: false,
            record_deposit,
            created_at,
            voting,
        }
    }

    pub fn phase(&self) -> BetPhase {
        if self.voting.is_resolved() {
            BetPhase::Resolved
        } else if self.accepted {
            BetPhase::Active
        } else {
            BetPhase::Open
        }
    }

    pub fn creator(&self) -> &Identity {
        &self.terms.creator
    }

    pub fn challenger(&self) -> &Identity {
        &self.terms.challenger
    }

    /// Identity paid out when `outcome` wins
    pub fn beneficiary(&self, outcome: Outcome) -> &Identity {
        match outcome {
            Outcome::CreatorWins => &self.terms.creator,
            Outcome::ChallengerWins => &self.terms.challenger,
        }
    }

    /// Position of `identity` in the resolver group
    pub fn resolver_position(&self, identity: &Identity) -> Option<usize> {
        self.terms.resolver_group.iter().position(|r| r == identity)
    }

    /// Pot once both stakes are in; checked at creation
    pub fn total_stake(&self) -> u64 {
        self.terms.creator_stake.saturating_add(self.terms.challenger_stake)
    }
}
