//! Line-oriented request dispatch.
//!
//! Each request is one JSON object naming the authenticated caller and
//! the operation; each response is one JSON object. Authentication itself
//! happens upstream, in the transport that hands lines to this module.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::error::BetResult;
use crate::ledger::Ledger;
use crate::models::{Identity, Outcome};
use crate::repositories::BetStore;
use crate::services::{BettingService, CreateBetRequest};

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub caller: Identity,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateBet(CreateBetRequest),
    AcceptBet { bet_id: u64 },
    CastPlayerVote { bet_id: u64, outcome: Outcome },
    ResolverVote { bet_id: u64, outcome: Outcome },
    ClaimWinnings { bet_id: u64 },
    CancelBet { bet_id: u64 },
    GetBet { bet_id: u64 },
    CustodyBalance { bet_id: u64 },
    Balance,
    ListBets,
}

impl Command {
    /// Whether the command can change persisted state
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Command::GetBet { .. } | Command::CustodyBalance { .. } | Command::Balance | Command::ListBets
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message: message.into(),
            }),
        }
    }
}

fn respond<T: Serialize>(result: BetResult<T>) -> Response {
    match result {
        Ok(value) => match serde_json::to_value(value) {
            Ok(json) => Response::success(json),
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Response::failure("serialization", e.to_string())
            }
        },
        Err(e) => Response::failure(e.code(), e.to_string()),
    }
}

/// Run one request against the service
pub async fn dispatch<S: BetStore, L: Ledger>(service: &BettingService<S, L>, request: Request) -> Response {
    let caller = request.caller;

    match request.command {
        Command::CreateBet(create) => respond(service.create_bet(&caller, create).await),
        Command::AcceptBet { bet_id } => respond(service.accept_bet(&caller, bet_id).await),
        Command::CastPlayerVote { bet_id, outcome } => {
            respond(service.cast_player_vote(&caller, bet_id, outcome).await)
        }
        Command::ResolverVote { bet_id, outcome } => {
            respond(service.resolver_vote(&caller, bet_id, outcome).await)
        }
        Command::ClaimWinnings { bet_id } => respond(service.claim_winnings(&caller, bet_id).await),
        Command::CancelBet { bet_id } => respond(service.cancel_bet(&caller, bet_id).await),
        Command::GetBet { bet_id } => respond(service.get_bet(bet_id).await.map(|bet| {
            serde_json::json!({ "phase": bet.phase(), "bet": bet })
        })),
        Command::CustodyBalance { bet_id } => respond(
            service
                .custody_balance(bet_id)
                .await
                .map(|balance| serde_json::json!({ "bet_id": bet_id, "balance": balance })),
        ),
        Command::Balance => {
            let balance = service.balance_of(&caller).await;
            Response::success(serde_json::json!({ "identity": caller, "balance": balance }))
        }
        Command::ListBets => respond(service.list_bets().await),
    }
}

/// Parse and run one request line.
///
/// Returns the response and whether persisted state may have changed.
pub async fn handle_line<S: BetStore, L: Ledger>(service: &BettingService<S, L>, line: &str) -> (Response, bool) {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed request: {}", e);
            return (Response::failure("invalid_request", e.to_string()), false);
        }
    };

    let mutating = request.command.is_mutating();
    let response = dispatch(service, request).await;
    let changed = mutating && response.ok;
    (response, changed)
}
