use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    #[error("Dex not found: {0}")]
    DexNotFound(String),

    #[error("Contract already exists: {0}")]
    ContractExists(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Core error: {0}")]
    Core(#[from] minidex_core::CoreError),
}
