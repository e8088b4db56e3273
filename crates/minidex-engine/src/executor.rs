use std::fmt;

use minidex_core::{Address, Amount, Call, EventLog, Hash, Transaction};
use minidex_state::{LedgerState, Storage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::amm;
use crate::error::DexError;
use crate::token;
use crate::validation::validate_transaction;

/// Value a call hands back to its sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutput {
    /// Address of a newly deployed contract
    Address(Address),
    /// Tokens received, e.g. the output of a swap
    Amount(Amount),
}

impl fmt::Display for CallOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOutput::Address(address) => write!(f, "{}", address),
            CallOutput::Amount(amount) => write!(f, "{}", amount),
        }
    }
}

/// Result of executing a transaction
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Transaction hash
    pub tx_hash: Hash,
    /// Whether the call applied
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
    pub return_value: Option<CallOutput>,
    /// Events of a successful call; empty on failure
    pub events: Vec<EventLog>,
}

impl ExecutionResult {
    fn failed(tx_hash: Hash, error: String) -> Self {
        ExecutionResult {
            tx_hash,
            success: false,
            error: Some(error),
            return_value: None,
            events: vec![],
        }
    }
}

/// Transaction executor
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor;

impl Executor {
    pub fn new() -> Self {
        Executor
    }

    /// Execute a single transaction.
    ///
    /// A transaction that fails validation leaves the ledger untouched. One
    /// that passes always consumes the sender's nonce; its call either
    /// applies in full or not at all.
    pub fn execute_transaction<S: Storage>(
        &self,
        tx: &Transaction,
        state: &mut LedgerState<S>,
    ) -> ExecutionResult {
        let tx_hash = match tx.hash() {
            Ok(h) => h,
            Err(e) => {
                return ExecutionResult::failed(
                    Hash::ZERO,
                    format!("Failed to hash transaction: {}", e),
                )
            }
        };

        debug!("Executing transaction {} ({})", tx_hash, tx.call.name());

        let validation = validate_transaction(tx, state);
        if !validation.is_valid {
            let error_msg = validation
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown validation error".to_string());
            warn!("Transaction {} rejected: {}", tx_hash, error_msg);
            return ExecutionResult::failed(tx_hash, error_msg);
        }

        let sender = tx.sender();
        let mut events = Vec::new();
        let outcome = self.execute_call(&tx.call, &sender, tx.nonce, state, &mut events);

        state.increment_nonce(&sender);

        match outcome {
            Ok(return_value) => {
                info!("Transaction {} ({}) executed", tx_hash, tx.call.name());
                ExecutionResult {
                    tx_hash,
                    success: true,
                    error: None,
                    return_value,
                    events,
                }
            }
            Err(e) => {
                warn!("Transaction {} ({}) failed: {}", tx_hash, tx.call.name(), e);
                ExecutionResult::failed(tx_hash, e.to_string())
            }
        }
    }

    fn execute_call<S: Storage>(
        &self,
        call: &Call,
        sender: &Address,
        nonce: u64,
        state: &mut LedgerState<S>,
        events: &mut Vec<EventLog>,
    ) -> Result<Option<CallOutput>, DexError> {
        match call {
            Call::DeployToken {
                name,
                symbol,
                decimals,
                initial_supply,
            } => {
                let address = token::deploy_token(
                    state,
                    sender,
                    nonce,
                    name,
                    symbol,
                    *decimals,
                    *initial_supply,
                    events,
                )?;
                Ok(Some(CallOutput::Address(address)))
            }

            Call::DeployDex => {
                let address = amm::deploy_dex(state, sender, nonce, events)?;
                Ok(Some(CallOutput::Address(address)))
            }

            Call::Approve {
                token,
                spender,
                amount,
            } => {
                token::approve(state, token, sender, spender, *amount, events)?;
                Ok(None)
            }

            Call::Transfer { token, to, amount } => {
                token::transfer(state, token, sender, to, *amount, events)?;
                Ok(None)
            }

            Call::TransferFrom {
                token,
                from,
                to,
                amount,
            } => {
                token::transfer_from(state, token, sender, from, to, *amount, events)?;
                Ok(None)
            }

            Call::SetFailTransfers { token, fail } => {
                token::set_fail_transfers(state, token, sender, *fail, events)?;
                Ok(None)
            }

            Call::AddLiquidity {
                dex,
                token_x,
                token_y,
                amount_x,
                amount_y,
            } => {
                amm::add_liquidity(
                    state, dex, sender, token_x, token_y, *amount_x, *amount_y, events,
                )?;
                Ok(None)
            }

            Call::Swap {
                dex,
                token_in,
                token_out,
                amount_in,
            } => {
                let amount_out =
                    amm::swap(state, dex, sender, token_in, token_out, *amount_in, events)?;
                Ok(Some(CallOutput::Amount(amount_out)))
            }
        }
    }

    /// Execute transactions in order
    pub fn execute_transactions<S: Storage>(
        &self,
        txs: &[Transaction],
        state: &mut LedgerState<S>,
    ) -> Vec<ExecutionResult> {
        txs.iter()
            .map(|tx| self.execute_transaction(tx, state))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minidex_core::{DexEvent, KeyPair, DEFAULT_INITIAL_SUPPLY};
    use minidex_state::MemoryStorage;

    fn deploy_call(name: &str, symbol: &str) -> Call {
        Call::DeployToken {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals: 18,
            initial_supply: DEFAULT_INITIAL_SUPPLY,
        }
    }

    #[test]
    fn test_deploy_token_returns_address() {
        let mut state = LedgerState::new(MemoryStorage::new(), 1);
        let deployer = KeyPair::generate();
        let executor = Executor::new();

        let tx = Transaction::new_signed(0, deploy_call("Mock USDC", "USDC"), &deployer.secret)
            .unwrap();
        let result = executor.execute_transaction(&tx, &mut state);

        assert!(result.success);
        let expected = Address::contract(&deployer.address(), 0);
        assert_eq!(result.return_value, Some(CallOutput::Address(expected)));
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.event, DexEvent::TokenDeployed { .. })));
        assert_eq!(
            state.get_token(&expected).unwrap().balance_of(&deployer.address()),
            DEFAULT_INITIAL_SUPPLY
        );
    }

    #[test]
    fn test_failed_call_consumes_nonce() {
        let mut state = LedgerState::new(MemoryStorage::new(), 1);
        let sender = KeyPair::generate();
        let executor = Executor::new();

        let tx = Transaction::new_signed(
            0,
            Call::Transfer {
                token: Address([9; 20]),
                to: Address([2; 20]),
                amount: 1,
            },
            &sender.secret,
        )
        .unwrap();
        let result = executor.execute_transaction(&tx, &mut state);

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown token"));
        assert!(result.events.is_empty());
        assert_eq!(state.nonce(&sender.address()), 1);
    }

    #[test]
    fn test_rejected_transaction_keeps_nonce() {
        let mut state = LedgerState::new(MemoryStorage::new(), 1);
        let sender = KeyPair::generate();
        let executor = Executor::new();

        let tx = Transaction::new_signed(3, deploy_call("Mock USDC", "USDC"), &sender.secret)
            .unwrap();
        let result = executor.execute_transaction(&tx, &mut state);

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Invalid nonce: expected 0, got 3")
        );
        assert_eq!(state.nonce(&sender.address()), 0);
        assert!(state.tokens.is_empty());
    }

    #[test]
    fn test_execute_transactions_in_order() {
        let mut state = LedgerState::new(MemoryStorage::new(), 1);
        let sender = KeyPair::generate();
        let executor = Executor::new();

        let txs = vec![
            Transaction::new_signed(0, deploy_call("Mock USDC", "USDC"), &sender.secret).unwrap(),
            Transaction::new_signed(1, deploy_call("Mock USDT", "USDT"), &sender.secret).unwrap(),
            Transaction::new_signed(2, Call::DeployDex, &sender.secret).unwrap(),
        ];
        let results = executor.execute_transactions(&txs, &mut state);

        assert!(results.iter().all(|r| r.success));
        assert_eq!(state.tokens.len(), 2);
        assert_eq!(state.dexes.len(), 1);
        assert_eq!(state.tx_count, 3);
    }
}
