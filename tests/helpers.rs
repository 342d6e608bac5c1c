#![allow(dead_code)]

use p2p_bet::models::*;
use p2p_bet::services::*;
use p2p_bet::{EscrowConfig, InMemoryBetStore, InMemoryBettingService, InMemoryLedger};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Opening balance of every funded fixture identity
pub const STARTING_BALANCE: u64 = 1_000_000;
pub const CREATOR_STAKE: u64 = 5_000;
pub const CHALLENGER_STAKE: u64 = 3_000;

/// Deterministic identity for tests
pub fn identity(n: u8) -> Identity {
    Identity::new([n; 32])
}

/// Test data fixtures
pub struct TestFixtures {
    pub creator: Identity,
    pub challenger: Identity,
    pub resolvers: Vec<Identity>,
    pub outsider: Identity,
}

impl TestFixtures {
    /// Two players, three resolvers and one unrelated identity
    pub fn new() -> Self {
        Self::with_resolvers(3)
    }

    pub fn with_resolvers(count: u8) -> Self {
        Self {
            creator: identity(1),
            challenger: identity(2),
            resolvers: (0..count).map(|i| identity(100 + i)).collect(),
            outsider: identity(99),
        }
    }

    /// Ledger where every fixture identity holds `STARTING_BALANCE`
    pub fn funded_ledger(&self) -> InMemoryLedger {
        let mut everyone = vec![self.creator, self.challenger, self.outsider];
        everyone.extend(self.resolvers.iter().copied());
        InMemoryLedger::with_balances(everyone.into_iter().map(|id| (id, STARTING_BALANCE)))
    }

    pub fn service(&self) -> InMemoryBettingService {
        InMemoryBettingService::new(InMemoryBetStore::new(), self.funded_ledger(), EscrowConfig::default())
    }

    pub fn create_request(&self, bet_id: u64) -> CreateBetRequest {
        CreateBetRequest {
            bet_id,
            resolver_group: self.resolvers.clone(),
            creator_stake: CREATOR_STAKE,
            challenger_stake: CHALLENGER_STAKE,
            challenger: self.challenger,
            deadline: future_deadline(),
        }
    }

    /// Record deposit charged for a bet over these resolvers
    pub fn record_deposit(&self) -> u64 {
        EscrowConfig::default()
            .record_deposit(self.resolvers.len())
            .expect("Failed to compute record deposit")
    }
}

pub fn future_deadline() -> i64 {
    chrono::Utc::now().timestamp() + 3_600
}

/// Create a bet with the fixture terms
pub async fn create_test_bet(service: &InMemoryBettingService, fixtures: &TestFixtures, bet_id: u64) -> Bet {
    service
        .create_bet(&fixtures.creator, fixtures.create_request(bet_id))
        .await
        .expect("Failed to create test bet")
}

/// Create and accept a bet with the fixture terms
pub async fn create_active_bet(service: &InMemoryBettingService, fixtures: &TestFixtures, bet_id: u64) -> Bet {
    create_test_bet(service, fixtures, bet_id).await;
    service
        .accept_bet(&fixtures.challenger, bet_id)
        .await
        .expect("Failed to accept test bet")
}

/// Clock the test can move forward
pub struct TestClock {
    now: Arc<AtomicI64>,
}

impl TestClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn clock(&self) -> Clock {
        let now = Arc::clone(&self.now);
        Arc::new(move || now.load(Ordering::SeqCst))
    }
}

/// Fresh scratch directory under the system temp dir
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "p2p_bet_{}_{}_{}",
        name,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    std::fs::create_dir_all(&dir).expect("Failed to create scratch directory");
    dir
}
