use serde::{Deserialize, Serialize};

use crate::error::BetError;

/// Settlement result of a bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Outcome {
    CreatorWins = 0,
    ChallengerWins = 1,
}

impl Outcome {
    pub const ALL: [Outcome; 2] = [Outcome::CreatorWins, Outcome::ChallengerWins];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::CreatorWins => "creator_wins",
            Outcome::ChallengerWins => "challenger_wins",
        }
    }

    /// Position of this outcome in per-outcome tallies
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Outcome {
    type Error = BetError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Outcome::CreatorWins),
            1 => Ok(Outcome::ChallengerWins),
            other => Err(BetError::InvalidOutcome(other)),
        }
    }
}

impl From<Outcome> for u8 {
    fn from(outcome: Outcome) -> Self {
        outcome as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_conversion() {
        assert_eq!(Outcome::try_from(0).unwrap(), Outcome::CreatorWins);
        assert_eq!(Outcome::try_from(1).unwrap(), Outcome::ChallengerWins);
        assert_eq!(Outcome::try_from(2), Err(BetError::InvalidOutcome(2)));
        assert_eq!(u8::from(Outcome::ChallengerWins), 1);
    }

    #[test]
    fn test_outcome_json_is_numeric() {
        assert_eq!(serde_json::to_string(&Outcome::CreatorWins).unwrap(), "0");
        assert!(serde_json::from_str::<Outcome>("5").is_err());
    }
}
