use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use minidex_core::serialize::amount_str;
use minidex_core::{Address, Amount, ContractKind, EventLog, Transaction};
use minidex_engine::{amm, token, validate_transaction, Executor};
use minidex_state::{LedgerState, Storage};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::error::RpcError;
use crate::ws::events::{EventBroadcaster, WsEvent};

/// Application state shared with handlers
pub struct AppState<S: Storage> {
    pub ledger: Arc<RwLock<LedgerState<S>>>,
    pub broadcaster: Arc<EventBroadcaster>,
    pub executor: Executor,
}

// Response types. They also derive `Deserialize` so the CLI client can
// decode them.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub chain_id: u64,
    pub tx_count: u64,
    pub token_count: usize,
    pub dex_count: usize,
    pub ws_subscribers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxResponse {
    pub hash: String,
    pub success: bool,
    pub error: Option<String>,
    /// Deployed contract address or swap output, as text
    pub return_value: Option<String>,
    pub events: Vec<EventLog>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: Address,
    pub nonce: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(with = "amount_str")]
    pub total_supply: Amount,
    pub owner: Address,
    pub fail_transfers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub token: Address,
    pub holder: Address,
    #[serde(with = "amount_str")]
    pub balance: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowanceResponse {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    #[serde(with = "amount_str")]
    pub allowance: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolResponse {
    pub dex: Address,
    pub token_x: Address,
    pub token_y: Address,
    #[serde(with = "amount_str")]
    pub reserve_a: Amount,
    #[serde(with = "amount_str")]
    pub reserve_b: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub dex: Address,
    pub token_in: Address,
    pub token_out: Address,
    #[serde(with = "amount_str")]
    pub amount_in: Amount,
    #[serde(with = "amount_str")]
    pub amount_out: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractResponse {
    pub address: Address,
    pub kind: ContractKind,
    pub contract_name: String,
    pub deployer: Address,
    pub constructor_args: Vec<String>,
    pub code_hash: String,
}

// Request types

#[derive(Debug, Serialize, Deserialize)]
pub struct TxSubmitRequest {
    pub transaction: Transaction,
}

fn parse_address(value: &str) -> Result<Address, RpcError> {
    value
        .parse()
        .map_err(|_| RpcError::BadRequest(format!("Invalid address: {}", value)))
}

fn parse_amount(value: &str) -> Result<Amount, RpcError> {
    value
        .parse()
        .map_err(|_| RpcError::BadRequest(format!("Invalid amount: {}", value)))
}

pub async fn get_status<S: Storage + Send + Sync>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<StatusResponse>, RpcError> {
    let ledger = state.ledger.read().await;

    Ok(Json(StatusResponse {
        chain_id: ledger.chain_id,
        tx_count: ledger.tx_count,
        token_count: ledger.tokens.len(),
        dex_count: ledger.dexes.len(),
        ws_subscribers: state.broadcaster.subscriber_count(),
    }))
}

/// Verify and execute a signed transaction.
///
/// Signature and nonce failures are rejected with 400 and do not touch the
/// ledger. A failing call still answers 200 with `success: false`, because
/// its nonce has been consumed. A persist failure is logged and does not
/// change the response.
pub async fn submit_tx<S: Storage + Send + Sync>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<TxSubmitRequest>,
) -> Result<Json<TxResponse>, RpcError> {
    let tx = request.transaction;

    let mut ledger = state.ledger.write().await;

    let validation = validate_transaction(&tx, &ledger);
    if !validation.is_valid {
        let msg = validation
            .error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Invalid transaction".to_string());
        return Err(RpcError::BadRequest(msg));
    }

    let result = state.executor.execute_transaction(&tx, &mut ledger);

    // Already applied in memory; the next persist picks it up.
    if let Err(e) = ledger.persist_state() {
        error!("Failed to persist ledger after {}: {}", result.tx_hash, e);
    }
    drop(ledger);

    info!(
        "Transaction {} applied (success: {})",
        result.tx_hash, result.success
    );

    state.broadcaster.broadcast(WsEvent::tx_applied(
        result.tx_hash,
        tx.sender(),
        tx.call.name(),
        result.success,
    ));
    for log in &result.events {
        state.broadcaster.broadcast(WsEvent::from_event_log(log));
    }

    Ok(Json(TxResponse {
        hash: result.tx_hash.to_hex(),
        success: result.success,
        error: result.error,
        return_value: result.return_value.map(|v| v.to_string()),
        events: result.events,
    }))
}

pub async fn get_account<S: Storage + Send + Sync>(
    State(state): State<Arc<AppState<S>>>,
    Path(address): Path<String>,
) -> Result<Json<AccountResponse>, RpcError> {
    let address = parse_address(&address)?;
    let ledger = state.ledger.read().await;

    Ok(Json(AccountResponse {
        address,
        nonce: ledger.nonce(&address),
    }))
}

pub async fn get_token<S: Storage + Send + Sync>(
    State(state): State<Arc<AppState<S>>>,
    Path(address): Path<String>,
) -> Result<Json<TokenResponse>, RpcError> {
    let address = parse_address(&address)?;
    let ledger = state.ledger.read().await;

    let token = ledger
        .get_token(&address)
        .ok_or_else(|| RpcError::NotFound(format!("Token {}", address)))?;

    Ok(Json(TokenResponse {
        address,
        name: token.meta.name.clone(),
        symbol: token.meta.symbol.clone(),
        decimals: token.meta.decimals,
        total_supply: token.meta.total_supply,
        owner: token.meta.owner,
        fail_transfers: token.fail_transfers,
    }))
}

pub async fn get_balance<S: Storage + Send + Sync>(
    State(state): State<Arc<AppState<S>>>,
    Path((token_addr, holder)): Path<(String, String)>,
) -> Result<Json<BalanceResponse>, RpcError> {
    let token_addr = parse_address(&token_addr)?;
    let holder = parse_address(&holder)?;
    let ledger = state.ledger.read().await;

    let balance = token::balance_of(&ledger, &token_addr, &holder)?;

    Ok(Json(BalanceResponse {
        token: token_addr,
        holder,
        balance,
    }))
}

pub async fn get_allowance<S: Storage + Send + Sync>(
    State(state): State<Arc<AppState<S>>>,
    Path((token_addr, owner, spender)): Path<(String, String, String)>,
) -> Result<Json<AllowanceResponse>, RpcError> {
    let token_addr = parse_address(&token_addr)?;
    let owner = parse_address(&owner)?;
    let spender = parse_address(&spender)?;
    let ledger = state.ledger.read().await;

    let allowance = token::allowance(&ledger, &token_addr, &owner, &spender)?;

    Ok(Json(AllowanceResponse {
        token: token_addr,
        owner,
        spender,
        allowance,
    }))
}

pub async fn get_pool<S: Storage + Send + Sync>(
    State(state): State<Arc<AppState<S>>>,
    Path((dex, token_x, token_y)): Path<(String, String, String)>,
) -> Result<Json<PoolResponse>, RpcError> {
    let dex = parse_address(&dex)?;
    let token_x = parse_address(&token_x)?;
    let token_y = parse_address(&token_y)?;
    let ledger = state.ledger.read().await;

    let pool = amm::get_pool(&ledger, &dex, &token_x, &token_y)?;

    Ok(Json(PoolResponse {
        dex,
        token_x,
        token_y,
        reserve_a: pool.reserve_a,
        reserve_b: pool.reserve_b,
    }))
}

pub async fn get_quote<S: Storage + Send + Sync>(
    State(state): State<Arc<AppState<S>>>,
    Path((dex, token_in, token_out, amount_in)): Path<(String, String, String, String)>,
) -> Result<Json<QuoteResponse>, RpcError> {
    let dex = parse_address(&dex)?;
    let token_in = parse_address(&token_in)?;
    let token_out = parse_address(&token_out)?;
    let amount_in = parse_amount(&amount_in)?;
    let ledger = state.ledger.read().await;

    let amount_out = amm::quote(&ledger, &dex, &token_in, &token_out, amount_in)?;

    Ok(Json(QuoteResponse {
        dex,
        token_in,
        token_out,
        amount_in,
        amount_out,
    }))
}

pub async fn get_contract<S: Storage + Send + Sync>(
    State(state): State<Arc<AppState<S>>>,
    Path(address): Path<String>,
) -> Result<Json<ContractResponse>, RpcError> {
    let address = parse_address(&address)?;
    let ledger = state.ledger.read().await;

    let info = ledger
        .get_contract(&address)
        .ok_or_else(|| RpcError::NotFound(format!("Contract {}", address)))?;

    Ok(Json(ContractResponse {
        address,
        kind: info.kind,
        contract_name: info.kind.contract_name().to_string(),
        deployer: info.deployer,
        constructor_args: info.constructor_args.clone(),
        code_hash: info.code_hash.to_hex(),
    }))
}
