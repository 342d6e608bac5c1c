//! P2P Bet Library
//!
//! Two-party wagering escrow: a creator and a challenger lock stakes on an
//! outcome, settle it by agreement or by majority of a fixed resolver
//! group, and the winner claims the whole pot.

pub mod auth;
pub mod command;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod repositories;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use config::{AppConfig, EscrowConfig};
pub use error::{AppError, AppResult, BetError, BetResult};
pub use ledger::{InMemoryLedger, Ledger, Movement};
pub use models::{Bet, BetPhase, Identity, Outcome};
pub use repositories::{BetStore, InMemoryBetStore, Snapshot};
pub use services::{BettingService, CreateBetRequest, VoteEffect};

/// Service over the in-memory store and ledger, as run by the binary
pub type InMemoryBettingService = BettingService<InMemoryBetStore, InMemoryLedger>;
