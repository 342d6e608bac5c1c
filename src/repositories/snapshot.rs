//! Point-in-time copy of the store and ledger, persisted as JSON.
//!
//! The payload is guarded by a SHA-256 checksum so a truncated or
//! hand-edited file is refused instead of silently loaded.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::ledger::InMemoryLedger;
use crate::repositories::InMemoryBetStore;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub saved_at: i64,
    pub store: InMemoryBetStore,
    pub ledger: InMemoryLedger,
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    checksum: String,
    payload: String,
}

fn checksum(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}

impl Snapshot {
    pub fn new(store: InMemoryBetStore, ledger: InMemoryLedger) -> Self {
        Self {
            saved_at: chrono::Utc::now().timestamp(),
            store,
            ledger,
        }
    }

    pub fn to_json(&self) -> AppResult<String> {
        let payload = serde_json::to_string(self)?;
        let file = SnapshotFile {
            version: SNAPSHOT_VERSION,
            checksum: checksum(&payload),
            payload,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn from_json(json: &str) -> AppResult<Self> {
        let file: SnapshotFile = serde_json::from_str(json)?;
        if file.version != SNAPSHOT_VERSION {
            return Err(AppError::Snapshot(format!(
                "Unsupported snapshot version {}",
                file.version
            )));
        }
        if checksum(&file.payload) != file.checksum {
            return Err(AppError::Snapshot("Checksum mismatch".to_string()));
        }
        Ok(serde_json::from_str(&file.payload)?)
    }

    /// Write atomically by renaming a temporary sibling over the target
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let json = self.to_json()?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        info!("Snapshot saved: {:?} ({} bets)", path, self.store.len());
        Ok(())
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let json = fs::read_to_string(path)?;
        let snapshot = Self::from_json(&json)?;
        info!("Snapshot loaded: {:?} ({} bets)", path, snapshot.store.len());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    #[test]
    fn test_snapshot_checksum_detects_tampering() {
        let ledger = InMemoryLedger::with_balances([(Identity::new([1; 32]), 500)]);
        let snapshot = Snapshot::new(InMemoryBetStore::new(), ledger);
        let json = snapshot.to_json().unwrap();

        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);

        let tampered = json.replace("500", "900");
        assert!(matches!(
            Snapshot::from_json(&tampered),
            Err(AppError::Snapshot(_))
        ));
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "p2p_bet_snapshot_{}_{}.json",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let snapshot = Snapshot::new(InMemoryBetStore::new(), InMemoryLedger::new());

        snapshot.save(&path).unwrap();
        let loaded = Snapshot::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, snapshot);
    }
}
