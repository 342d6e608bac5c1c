use std::env;
use std::path::PathBuf;

use crate::error::{BetError, BetResult};

/// Escrow configuration
#[derive(Debug, Clone)]
pub struct EscrowConfig {
    /// Fixed part of the record deposit charged to the creator
    pub record_deposit_base: u64,
    /// Additional record deposit per resolver in the group
    pub record_deposit_per_resolver: u64,
    /// Largest resolver group a bet may name
    pub max_resolvers: usize,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub escrow: EscrowConfig,
    pub log_level: String,
    pub log_format: String,
    pub environment: String,
    pub snapshot_path: Option<PathBuf>,
    pub audit_log_dir: Option<PathBuf>,
    /// Opening ledger balances, used only when no snapshot exists yet
    pub ledger_seed_path: Option<PathBuf>,
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("{} is not a valid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

/// Optional path that must name an existing file when set
fn existing_file_var(name: &str) -> Result<Option<PathBuf>, String> {
    match env::var(name) {
        Ok(raw) => {
            let path = PathBuf::from(&raw);
            if !path.is_file() {
                return Err(format!("{} does not name a readable file: {}", name, raw));
            }
            Ok(Some(path))
        }
        Err(_) => Ok(None),
    }
}

impl EscrowConfig {
    /// Create escrow config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let record_deposit_base = parse_var("RECORD_DEPOSIT_BASE", 1_000u64)?;
        let record_deposit_per_resolver = parse_var("RECORD_DEPOSIT_PER_RESOLVER", 100u64)?;
        let max_resolvers = parse_var("MAX_RESOLVERS", 10usize)?;

        if max_resolvers == 0 {
            return Err("MAX_RESOLVERS must be greater than 0".to_string());
        }

        Ok(Self {
            record_deposit_base,
            record_deposit_per_resolver,
            max_resolvers,
        })
    }

    /// Deposit covering the storage overhead of a bet record with
    /// `resolver_count` resolvers. Refunded to the creator on close.
    pub fn record_deposit(&self, resolver_count: usize) -> BetResult<u64> {
        let per_resolver = (resolver_count as u64)
            .checked_mul(self.record_deposit_per_resolver)
            .ok_or(BetError::ArithmeticOverflow)?;
        self.record_deposit_base
            .checked_add(per_resolver)
            .ok_or(BetError::ArithmeticOverflow)
    }
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            record_deposit_base: 1_000,
            record_deposit_per_resolver: 100,
            max_resolvers: 10,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let escrow = EscrowConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let snapshot_path = env::var("SNAPSHOT_PATH").ok().map(PathBuf::from);
        let audit_log_dir = env::var("AUDIT_LOG_DIR").ok().map(PathBuf::from);
        let ledger_seed_path = existing_file_var("LEDGER_SEED_PATH")?;

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&log_format.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_FORMAT: {}. Must be one of: {:?}",
                log_format, valid_log_formats
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        Ok(Self {
            escrow,
            log_level: log_level.to_lowercase(),
            log_format: log_format.to_lowercase(),
            environment: environment.to_lowercase(),
            snapshot_path,
            audit_log_dir,
            ledger_seed_path,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if log lines should be emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            escrow: EscrowConfig::default(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            environment: "development".to_string(),
            snapshot_path: None,
            audit_log_dir: None,
            ledger_seed_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escrow_config_default() {
        let config = EscrowConfig::default();
        assert_eq!(config.record_deposit_base, 1_000);
        assert_eq!(config.max_resolvers, 10);
    }

    #[test]
    fn test_record_deposit_scales_with_group() {
        let config = EscrowConfig::default();
        assert_eq!(config.record_deposit(1).unwrap(), 1_100);
        assert_eq!(config.record_deposit(3).unwrap(), 1_300);
    }

    #[test]
    fn test_record_deposit_overflow() {
        let config = EscrowConfig {
            record_deposit_base: u64::MAX,
            record_deposit_per_resolver: 1,
            max_resolvers: 10,
        };
        assert_eq!(config.record_deposit(1), Err(BetError::ArithmeticOverflow));
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(!config.is_production());
        assert!(!config.json_logs());
        assert!(config.snapshot_path.is_none());
        assert!(config.ledger_seed_path.is_none());
    }

    #[test]
    fn test_ledger_seed_path_must_exist() {
        let missing = env::temp_dir().join(format!("p2p_bet_missing_seed_{}.json", std::process::id()));
        assert!(existing_file_var_with("P2P_BET_TEST_SEED_MISSING", &missing).is_err());

        let present = env::temp_dir().join(format!("p2p_bet_seed_{}.json", std::process::id()));
        std::fs::write(&present, "{}").unwrap();
        assert_eq!(
            existing_file_var_with("P2P_BET_TEST_SEED_PRESENT", &present).unwrap(),
            Some(present.clone())
        );
        std::fs::remove_file(&present).unwrap();

        assert_eq!(existing_file_var("P2P_BET_TEST_SEED_UNSET").unwrap(), None);
    }

    fn existing_file_var_with(name: &str, path: &std::path::Path) -> Result<Option<PathBuf>, String> {
        env::set_var(name, path);
        let result = existing_file_var(name);
        env::remove_var(name);
        result
    }
}
