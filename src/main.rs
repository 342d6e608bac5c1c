//! P2P Bet Service
//!
//! Reads one JSON request per line from stdin and answers with one JSON
//! response per line on stdout. Logs go to stderr. When `SNAPSHOT_PATH`
//! is set, state is loaded from it at start and saved after every
//! successful mutating request, before the response is written.

use anyhow::Context;
use p2p_bet::services::AuditTrailService;
use p2p_bet::session::Session;
use p2p_bet::{AppConfig, AppError, InMemoryBetStore, InMemoryBettingService, InMemoryLedger, Snapshot};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("p2p_bet={}", config.log_level).into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.json_logs() {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn opening_ledger(config: &AppConfig) -> anyhow::Result<InMemoryLedger> {
    match &config.ledger_seed_path {
        Some(path) => InMemoryLedger::load_seed(path)
            .with_context(|| format!("Failed to load ledger seed {:?}", path)),
        None => {
            warn!("No LEDGER_SEED_PATH set, every balance starts at zero");
            Ok(InMemoryLedger::new())
        }
    }
}

fn load_service(config: &AppConfig) -> anyhow::Result<InMemoryBettingService> {
    let service = match &config.snapshot_path {
        Some(path) if path.exists() => {
            let snapshot = Snapshot::load(path)
                .with_context(|| format!("Failed to load snapshot {:?}", path))?;
            if config.ledger_seed_path.is_some() {
                info!("Snapshot present, ignoring LEDGER_SEED_PATH");
            }
            InMemoryBettingService::from_snapshot(snapshot, config.escrow.clone())
        }
        other => {
            if let Some(path) = other {
                warn!("Snapshot {:?} not found, starting from opening balances", path);
            }
            InMemoryBettingService::new(InMemoryBetStore::new(), opening_ledger(config)?, config.escrow.clone())
        }
    };

    match &config.audit_log_dir {
        Some(dir) => {
            let audit = AuditTrailService::new(dir.clone()).context("Audit trail initialization failed")?;
            Ok(service.with_audit(Arc::new(audit)))
        }
        None => Ok(service),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().map_err(AppError::Config)?;
    init_tracing(&config);

    info!("P2P bet service starting");
    info!("Environment: {}", config.environment);
    info!(
        "Record deposit: {} + {} per resolver, max {} resolvers",
        config.escrow.record_deposit_base,
        config.escrow.record_deposit_per_resolver,
        config.escrow.max_resolvers
    );
    if config.is_production() && config.snapshot_path.is_none() {
        warn!("Running in production without SNAPSHOT_PATH: state is lost on exit");
    }

    let session = Session::new(load_service(&config)?, config.snapshot_path.clone());
    session
        .run(BufReader::new(tokio::io::stdin()), &mut tokio::io::stdout())
        .await
        .context("Session aborted")?;

    info!("P2P bet service shutdown complete");
    Ok(())
}
