use thiserror::Error;

/// Errors raised by bet lifecycle operations.
///
/// Every variant aborts the whole operation: custody balances, ledger
/// balances and the bet record are left exactly as they were.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BetError {
    /// Caller does not hold the role required for this phase
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bet or custody record absent (never created, or already closed)
    #[error("Bet {0} not found")]
    NotFound(u64),

    /// Bet index already in use
    #[error("Bet {0} already exists")]
    BetExists(u64),

    #[error("Bet has already been accepted")]
    AlreadyAccepted,

    #[error("Bet has not been accepted")]
    NotAccepted,

    #[error("This identity already voted")]
    AlreadyVoted,

    #[error("Bet is already resolved")]
    AlreadyResolved,

    #[error("Bet is not resolved")]
    NotResolved,

    /// Bad stake or resolver-group shape at creation
    #[error("Invalid terms: {0}")]
    InvalidTerms(String),

    #[error("Invalid outcome: {0}")]
    InvalidOutcome(u8),

    #[error("Bet deadline has passed")]
    DeadlinePassed,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// Underlying value movement could not complete
    #[error("Transfer failed: {0}")]
    TransferFailure(String),

    /// Key-value store rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for bet operations
pub type BetResult<T> = Result<T, BetError>;

impl BetError {
    /// Stable machine-readable code, used on the command protocol
    pub fn code(&self) -> &'static str {
        match self {
            BetError::Unauthorized(_) => "unauthorized",
            BetError::NotFound(_) => "not_found",
            BetError::BetExists(_) => "bet_exists",
            BetError::AlreadyAccepted => "already_accepted",
            BetError::NotAccepted => "not_accepted",
            BetError::AlreadyVoted => "already_voted",
            BetError::AlreadyResolved => "already_resolved",
            BetError::NotResolved => "not_resolved",
            BetError::InvalidTerms(_) => "invalid_terms",
            BetError::InvalidOutcome(_) => "invalid_outcome",
            BetError::DeadlinePassed => "deadline_passed",
            BetError::ArithmeticOverflow => "arithmetic_overflow",
            BetError::TransferFailure(_) => "transfer_failure",
            BetError::Storage(_) => "storage",
        }
    }
}

/// Store-specific error types
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record with this index is already present
    #[error("Duplicate record: {0}")]
    Duplicate(u64),

    /// Backend could not serve the request
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for BetError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(id) => BetError::BetExists(id),
            StoreError::Backend(msg) => BetError::Storage(msg),
        }
    }
}

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bet lifecycle errors
    #[error(transparent)]
    Bet(#[from] BetError),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot integrity errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
