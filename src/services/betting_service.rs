//! Betting service: the public face of the escrow.
//!
//! Every operation runs under one lock and is all-or-nothing. The new bet
//! and custody state is computed on copies first. Then the ledger batch is
//! applied, and only then is the store written. If that write fails the
//! ledger batch is reversed.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::auth;
use crate::config::EscrowConfig;
use crate::error::{AppResult, BetError, BetResult, StoreError};
use crate::ledger::{InMemoryLedger, Ledger, Movement};
use crate::models::{Bet, BetTerms, Custody, Identity, Outcome};
use crate::repositories::{BetStore, InMemoryBetStore, Snapshot};
use crate::services::audit::AuditTrailService;
use crate::services::escrow;
use crate::services::settlement::{self, CancelReceipt, ClaimReceipt};
use crate::services::voting::{self, VoteEffect};

/// Source of the current UNIX time
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp())
}

/// Parameters of a new bet; the caller becomes the creator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBetRequest {
    pub bet_id: u64,
    pub resolver_group: Vec<Identity>,
    pub creator_stake: u64,
    pub challenger_stake: u64,
    pub challenger: Identity,
    pub deadline: i64,
}

/// Store and ledger, always mutated together under the service lock
struct Vault<S, L> {
    store: S,
    ledger: L,
}

impl<S: BetStore, L: Ledger> Vault<S, L> {
    fn load(&self, bet_id: u64) -> BetResult<(Bet, Custody)> {
        let bet = self.store.get_bet(bet_id)?.ok_or(BetError::NotFound(bet_id))?;
        let custody = self
            .store
            .get_custody(bet_id)?
            .ok_or(BetError::NotFound(bet_id))?;
        Ok((bet, custody))
    }

    /// Apply `movements`, then `write`; undo the movements if the write fails
    fn commit<F>(&mut self, movements: &[Movement], write: F) -> BetResult<()>
    where
        F: FnOnce(&mut S) -> Result<(), StoreError>,
    {
        self.ledger.apply(movements)?;

        if let Err(err) = write(&mut self.store) {
            let undo: Vec<Movement> = movements.iter().rev().map(Movement::inverse).collect();
            if let Err(undo_err) = self.ledger.apply(&undo) {
                error!("Failed to reverse ledger movements after store error: {}", undo_err);
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn create(&mut self, caller: &Identity, request: CreateBetRequest, config: &EscrowConfig, now: i64) -> BetResult<Bet> {
        let bet_id = request.bet_id;
        if self.store.get_bet(bet_id)?.is_some() {
            return Err(BetError::BetExists(bet_id));
        }

        let terms = BetTerms {
            creator: *caller,
            challenger: request.challenger,
            resolver_group: request.resolver_group,
            creator_stake: request.creator_stake,
            challenger_stake: request.challenger_stake,
            deadline: request.deadline,
        };
        terms.validate(config.max_resolvers, now)?;

        let record_deposit = config.record_deposit(terms.resolver_group.len())?;
        let creator_stake = terms.creator_stake;
        let bet = Bet::new(bet_id, terms, record_deposit, now);

        let mut custody = escrow::open(bet_id);
        let mut movements = vec![escrow::deposit(&mut custody, *caller, creator_stake)?];
        if record_deposit > 0 {
            movements.push(Movement::Debit {
                from: *caller,
                amount: record_deposit,
            });
        }

        let stored = bet.clone();
        self.commit(&movements, move |store| store.insert(stored, custody))?;
        Ok(bet)
    }

    fn accept(&mut self, caller: &Identity, bet_id: u64, now: i64) -> BetResult<Bet> {
        let (mut bet, mut custody) = self.load(bet_id)?;

        if bet.accepted {
            return Err(BetError::AlreadyAccepted);
        }
        auth::require_challenger(&bet, caller)?;
        if now > bet.terms.deadline {
            return Err(BetError::DeadlinePassed);
        }
        escrow::verify(&bet, &custody)?;

        let movement = escrow::deposit(&mut custody, *caller, bet.terms.challenger_stake)?;
        bet.accepted = true;

        let stored = bet.clone();
        self.commit(&[movement], move |store| store.update(stored, custody))?;
        Ok(bet)
    }

    fn vote<F>(&mut self, caller: &Identity, bet_id: u64, cast: F) -> BetResult<(Bet, VoteEffect)>
    where
        F: FnOnce(&mut Bet, &Identity) -> BetResult<VoteEffect>,
    {
        let (mut bet, custody) = self.load(bet_id)?;
        let effect = cast(&mut bet, caller)?;

        let stored = bet.clone();
        self.commit(&[], move |store| store.update(stored, custody))?;
        Ok((bet, effect))
    }

    fn claim(&mut self, caller: &Identity, bet_id: u64) -> BetResult<ClaimReceipt> {
        let (bet, custody) = self.load(bet_id)?;
        let closure = settlement::settle_claim(&bet, custody, caller)?;

        self.commit(&closure.movements, |store| store.remove(bet_id).map(|_| ()))?;
        Ok(closure.receipt)
    }

    fn cancel(&mut self, caller: &Identity, bet_id: u64) -> BetResult<CancelReceipt> {
        let (bet, custody) = self.load(bet_id)?;
        let closure = settlement::settle_cancel(&bet, custody, caller)?;

        self.commit(&closure.movements, |store| store.remove(bet_id).map(|_| ()))?;
        Ok(closure.receipt)
    }
}

fn rejected(operation: &str, bet_id: u64, caller: &Identity, err: BetError) -> BetError {
    warn!("{} rejected: bet={}, caller={}, error={}", operation, bet_id, caller, err);
    err
}

/// A deadlock can be completed by either kind of vote
fn warn_if_deadlocked(bet: &Bet) {
    if voting::is_deadlocked(bet) {
        warn!("Bet {} is deadlocked: no outcome can reach a resolver majority", bet.id);
    }
}

fn record_audit(result: AppResult<()>) {
    if let Err(e) = result {
        error!("Failed to write audit entry: {}", e);
    }
}

/// Two-party escrow with resolver-group dispute settlement
pub struct BettingService<S, L> {
    vault: Mutex<Vault<S, L>>,
    config: EscrowConfig,
    clock: Clock,
    audit: Option<Arc<AuditTrailService>>,
}

impl<S: BetStore, L: Ledger> BettingService<S, L> {
    pub fn new(store: S, ledger: L, config: EscrowConfig) -> Self {
        Self {
            vault: Mutex::new(Vault { store, ledger }),
            config,
            clock: system_clock(),
            audit: None,
        }
    }

    /// Record every committed operation to an audit trail
    pub fn with_audit(mut self, audit: Arc<AuditTrailService>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Open a bet and lock the caller's stake and record deposit
    pub async fn create_bet(&self, caller: &Identity, request: CreateBetRequest) -> BetResult<Bet> {
        let bet_id = request.bet_id;
        info!(
            "CreateBet request: bet={}, creator={}, challenger={}, resolvers={}",
            bet_id,
            caller,
            request.challenger,
            request.resolver_group.len()
        );

        let now = (self.clock)();
        let mut vault = self.vault.lock().await;
        let bet = vault
            .create(caller, request, &self.config, now)
            .map_err(|e| rejected("CreateBet", bet_id, caller, e))?;

        info!(
            "Created bet {}: stakes {}/{}, record deposit {}",
            bet.id, bet.terms.creator_stake, bet.terms.challenger_stake, bet.record_deposit
        );
        if let Some(audit) = &self.audit {
            record_audit(audit.log_bet_created(&bet).await);
        }
        Ok(bet)
    }

    /// Lock the challenger's stake and activate the bet
    pub async fn accept_bet(&self, caller: &Identity, bet_id: u64) -> BetResult<Bet> {
        info!("AcceptBet request: bet={}, caller={}", bet_id, caller);

        let now = (self.clock)();
        let mut vault = self.vault.lock().await;
        let bet = vault
            .accept(caller, bet_id, now)
            .map_err(|e| rejected("AcceptBet", bet_id, caller, e))?;

        info!("Bet {} accepted, pot {}", bet_id, bet.total_stake());
        if let Some(audit) = &self.audit {
            record_audit(audit.log_bet_accepted(&bet).await);
        }
        Ok(bet)
    }

    /// Vote of the creator or the challenger
    pub async fn cast_player_vote(&self, caller: &Identity, bet_id: u64, outcome: Outcome) -> BetResult<VoteEffect> {
        info!("CastPlayerVote request: bet={}, caller={}, outcome={}", bet_id, caller, outcome.as_str());

        let mut vault = self.vault.lock().await;
        let (bet, effect) = vault
            .vote(caller, bet_id, |bet, voter| voting::cast_player_vote(bet, voter, outcome))
            .map_err(|e| rejected("CastPlayerVote", bet_id, caller, e))?;

        match effect {
            VoteEffect::Resolved(winner) => {
                info!("Bet {} resolved by player agreement: {}", bet_id, winner.as_str())
            }
            VoteEffect::Recorded if bet.voting.players_disagree() => {
                info!("Bet {}: players disagree, awaiting resolver majority", bet_id)
            }
            VoteEffect::Recorded => info!("Player vote recorded on bet {}", bet_id),
        }
        warn_if_deadlocked(&bet);
        if let Some(audit) = &self.audit {
            record_audit(
                audit
                    .log_vote_cast(bet_id, caller, "player", outcome, bet.voting.winner())
                    .await,
            );
        }
        Ok(effect)
    }

    /// Vote of a resolver-group member
    pub async fn resolver_vote(&self, caller: &Identity, bet_id: u64, outcome: Outcome) -> BetResult<VoteEffect> {
        info!("ResolverVote request: bet={}, caller={}, outcome={}", bet_id, caller, outcome.as_str());

        let mut vault = self.vault.lock().await;
        let (bet, effect) = vault
            .vote(caller, bet_id, |bet, voter| voting::cast_resolver_vote(bet, voter, outcome))
            .map_err(|e| rejected("ResolverVote", bet_id, caller, e))?;

        let tally = bet.voting.resolver_tally();
        match effect {
            VoteEffect::Resolved(winner) => info!(
                "Bet {} resolved by resolver majority: {} ({}-{})",
                bet_id,
                winner.as_str(),
                tally[0],
                tally[1]
            ),
            VoteEffect::Recorded => info!(
                "Resolver vote recorded on bet {} ({}-{} of {})",
                bet_id,
                tally[0],
                tally[1],
                bet.terms.resolver_group.len()
            ),
        }
        warn_if_deadlocked(&bet);
        if let Some(audit) = &self.audit {
            record_audit(
                audit
                    .log_vote_cast(bet_id, caller, "resolver", outcome, bet.voting.winner())
                    .await,
            );
        }
        Ok(effect)
    }

    /// Pay the winner, refund the creator's record deposit and close the bet
    pub async fn claim_winnings(&self, caller: &Identity, bet_id: u64) -> BetResult<ClaimReceipt> {
        info!("ClaimWinnings request: bet={}, caller={}", bet_id, caller);

        let mut vault = self.vault.lock().await;
        let receipt = vault
            .claim(caller, bet_id)
            .map_err(|e| rejected("ClaimWinnings", bet_id, caller, e))?;

        info!(
            "Bet {} closed: {} paid to {}, {} refunded to creator {}",
            bet_id, receipt.payout, receipt.winner, receipt.record_refund, receipt.creator
        );
        if let Some(audit) = &self.audit {
            record_audit(audit.log_winnings_claimed(&receipt).await);
        }
        Ok(receipt)
    }

    /// Withdraw an offer the challenger never accepted
    pub async fn cancel_bet(&self, caller: &Identity, bet_id: u64) -> BetResult<CancelReceipt> {
        info!("CancelBet request: bet={}, caller={}", bet_id, caller);

        let mut vault = self.vault.lock().await;
        let receipt = vault
            .cancel(caller, bet_id)
            .map_err(|e| rejected("CancelBet", bet_id, caller, e))?;

        info!(
            "Bet {} cancelled: {} stake and {} deposit refunded",
            bet_id, receipt.stake_refund, receipt.record_refund
        );
        if let Some(audit) = &self.audit {
            record_audit(audit.log_bet_cancelled(&receipt).await);
        }
        Ok(receipt)
    }

    pub async fn get_bet(&self, bet_id: u64) -> BetResult<Bet> {
        let vault = self.vault.lock().await;
        Ok(vault.load(bet_id)?.0)
    }

    pub async fn custody_balance(&self, bet_id: u64) -> BetResult<u64> {
        let vault = self.vault.lock().await;
        Ok(vault.load(bet_id)?.1.balance())
    }

    pub async fn balance_of(&self, identity: &Identity) -> u64 {
        self.vault.lock().await.ledger.balance(identity)
    }

    pub async fn list_bets(&self) -> BetResult<Vec<u64>> {
        let vault = self.vault.lock().await;
        Ok(vault.store.bet_ids()?)
    }

    pub async fn is_deadlocked(&self, bet_id: u64) -> BetResult<bool> {
        let vault = self.vault.lock().await;
        Ok(voting::is_deadlocked(&vault.load(bet_id)?.0))
    }
}

impl BettingService<InMemoryBetStore, InMemoryLedger> {
    /// Rebuild a service from a persisted snapshot
    pub fn from_snapshot(snapshot: Snapshot, config: EscrowConfig) -> Self {
        Self::new(snapshot.store, snapshot.ledger, config)
    }

    /// Copy of the current store and ledger
    pub async fn snapshot(&self) -> Snapshot {
        let vault = self.vault.lock().await;
        Snapshot::new(vault.store.clone(), vault.ledger.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> Identity {
        Identity::new([n; 32])
    }

    /// Store that refuses every write, to exercise the compensation path
    struct ReadOnlyStore(InMemoryBetStore);

    impl BetStore for ReadOnlyStore {
        fn get_bet(&self, bet_id: u64) -> Result<Option<Bet>, StoreError> {
            self.0.get_bet(bet_id)
        }
        fn get_custody(&self, bet_id: u64) -> Result<Option<Custody>, StoreError> {
            self.0.get_custody(bet_id)
        }
        fn insert(&mut self, _bet: Bet, _custody: Custody) -> Result<(), StoreError> {
            Err(StoreError::Backend("read-only".into()))
        }
        fn update(&mut self, _bet: Bet, _custody: Custody) -> Result<(), StoreError> {
            Err(StoreError::Backend("read-only".into()))
        }
        fn remove(&mut self, _bet_id: u64) -> Result<Option<(Bet, Custody)>, StoreError> {
            Err(StoreError::Backend("read-only".into()))
        }
        fn bet_ids(&self) -> Result<Vec<u64>, StoreError> {
            self.0.bet_ids()
        }
    }

    #[tokio::test]
    async fn test_store_failure_reverses_ledger() {
        let ledger = InMemoryLedger::with_balances([(id(1), 10_000)]);
        let service = BettingService::new(
            ReadOnlyStore(InMemoryBetStore::new()),
            ledger,
            EscrowConfig::default(),
        );

        let result = service
            .create_bet(
                &id(1),
                CreateBetRequest {
                    bet_id: 1,
                    resolver_group: vec![id(10)],
                    creator_stake: 500,
                    challenger_stake: 500,
                    challenger: id(2),
                    deadline: chrono::Utc::now().timestamp() + 3_600,
                },
            )
            .await;

        assert!(matches!(result, Err(BetError::Storage(_))));
        assert_eq!(service.balance_of(&id(1)).await, 10_000);
        assert_eq!(service.get_bet(1).await, Err(BetError::NotFound(1)));
    }
}
