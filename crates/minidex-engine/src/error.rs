use minidex_core::{Address, Amount};
use thiserror::Error;

/// Why a token refused to move funds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Transfers are disabled for this token")]
    Disabled,

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: Amount, need: Amount },

    #[error("Unknown token")]
    UnknownToken,
}

#[derive(Debug, Error)]
pub enum DexError {
    #[error("Tokens must be different")]
    InvalidPair,

    #[error("{0}")]
    InvalidAmount(&'static str),

    #[error("No liquidity for this pair")]
    NoLiquidity,

    /// A pull into or push out of the engine was refused by the token
    #[error("Transfer of {leg} failed")]
    TransferFailed {
        leg: &'static str,
        reason: TransferError,
    },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Unknown dex: {0}")]
    UnknownDex(Address),

    #[error("Unknown token: {0}")]
    UnknownToken(Address),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("State error: {0}")]
    State(#[from] minidex_state::StateError),

    #[error("Core error: {0}")]
    Core(#[from] minidex_core::CoreError),
}

impl DexError {
    pub(crate) fn transfer_failed(leg: &'static str) -> impl FnOnce(TransferError) -> DexError {
        move |reason| DexError::TransferFailed { leg, reason }
    }
}
