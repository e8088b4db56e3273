//! Minidex Engine - Token contracts, the AMM pool engine and transaction execution
//!
//! Every state-changing call is applied through the [`Executor`], which
//! verifies the signed transaction, consumes its nonce and dispatches to the
//! token or AMM operations. Those operations restore a ledger checkpoint on
//! failure, so a call either applies in full or not at all.

pub mod amm;
pub mod error;
pub mod executor;
pub mod token;
pub mod validation;

pub use amm::{add_liquidity, deploy_dex, get_pool, quote, swap};
pub use error::{DexError, TransferError};
pub use executor::{CallOutput, ExecutionResult, Executor};
pub use validation::{validate_transaction, ValidationResult};
