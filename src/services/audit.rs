use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::AppResult;
use crate::models::{Bet, Identity, Outcome};
use crate::services::settlement::{CancelReceipt, ClaimReceipt};

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: i64,
    pub event_type: String, // "bet_created", "bet_accepted", "vote_cast", ...
    pub bet_id: u64,
    pub caller: Identity,
    pub details: serde_json::Value,
}

/// Append-only JSON-lines record of every committed operation
pub struct AuditTrailService {
    log_file: PathBuf,
    file_handle: Arc<Mutex<std::fs::File>>,
}

impl AuditTrailService {
    /// Create a new audit trail service
    pub fn new(log_directory: PathBuf) -> AppResult<Self> {
        std::fs::create_dir_all(&log_directory)?;

        // One file per day
        let date = chrono::Utc::now().format("%Y-%m-%d");
        let log_file = log_directory.join(format!("audit_{}.log", date));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;

        info!("Audit trail initialized: {:?}", log_file);

        Ok(Self {
            log_file,
            file_handle: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_file
    }

    /// Log an audit entry
    pub async fn log(&self, entry: AuditLogEntry) -> AppResult<()> {
        let json = serde_json::to_string(&entry)?;

        let mut file = self.file_handle.lock().await;
        writeln!(file, "{}", json)?;
        file.flush()?;

        Ok(())
    }

    fn entry(event_type: &str, bet_id: u64, caller: &Identity, details: serde_json::Value) -> AuditLogEntry {
        AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: event_type.to_string(),
            bet_id,
            caller: *caller,
            details,
        }
    }

    pub async fn log_bet_created(&self, bet: &Bet) -> AppResult<()> {
        self.log(Self::entry(
            "bet_created",
            bet.id,
            bet.creator(),
            serde_json::json!({
                "challenger": bet.challenger().to_string(),
                "creator_stake": bet.terms.creator_stake,
                "challenger_stake": bet.terms.challenger_stake,
                "resolvers": bet.terms.resolver_group.len(),
                "deadline": bet.terms.deadline,
                "record_deposit": bet.record_deposit,
            }),
        ))
        .await
    }

    pub async fn log_bet_accepted(&self, bet: &Bet) -> AppResult<()> {
        self.log(Self::entry(
            "bet_accepted",
            bet.id,
            bet.challenger(),
            serde_json::json!({ "pot": bet.total_stake() }),
        ))
        .await
    }

    pub async fn log_vote_cast(
        &self,
        bet_id: u64,
        voter: &Identity,
        mode: &str,
        outcome: Outcome,
        resolved: Option<Outcome>,
    ) -> AppResult<()> {
        self.log(Self::entry(
            "vote_cast",
            bet_id,
            voter,
            serde_json::json!({
                "mode": mode,
                "outcome": outcome.as_str(),
                "resolved": resolved.map(|o| o.as_str()),
            }),
        ))
        .await
    }

    pub async fn log_winnings_claimed(&self, receipt: &ClaimReceipt) -> AppResult<()> {
        self.log(Self::entry(
            "winnings_claimed",
            receipt.bet_id,
            &receipt.winner,
            serde_json::to_value(receipt)?,
        ))
        .await
    }

    pub async fn log_bet_cancelled(&self, receipt: &CancelReceipt) -> AppResult<()> {
        self.log(Self::entry(
            "bet_cancelled",
            receipt.bet_id,
            &receipt.creator,
            serde_json::to_value(receipt)?,
        ))
        .await
    }
}
