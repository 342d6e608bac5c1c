pub mod bet_store;
pub mod snapshot;

// Re-export all repositories for convenient access
pub use bet_store::{BetStore, InMemoryBetStore};
pub use snapshot::Snapshot;
