//! Minidex State - Ledger state and storage
//!
//! This crate holds token ledgers, DEX pool registries and account nonces,
//! together with the storage backends they persist to.

pub mod error;
pub mod ledger;
pub mod state;
pub mod storage;

pub use error::StateError;
pub use ledger::{DexInstance, TokenLedger};
pub use state::{Checkpoint, LedgerState};
pub use storage::{FileStorage, MemoryStorage, Storage};
