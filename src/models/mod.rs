//! Domain models for the escrow.
//!
//! A bet record and its custody entry share one index and live and die
//! together; the voting state is embedded in the bet.

pub mod bet;
pub mod custody;
pub mod identity;
pub mod outcome;
pub mod voting;

// Re-export all models for convenient access
pub use bet::{Bet, BetPhase, BetTerms};
pub use custody::Custody;
pub use identity::Identity;
pub use outcome::Outcome;
pub use voting::{PlayerSeat, VotingState};
