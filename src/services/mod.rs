pub mod audit;
pub mod betting_service;
pub mod escrow;
pub mod settlement;
pub mod voting;

pub use audit::AuditTrailService;
pub use betting_service::{BettingService, Clock, CreateBetRequest};
pub use settlement::{CancelReceipt, ClaimReceipt};
pub use voting::VoteEffect;
