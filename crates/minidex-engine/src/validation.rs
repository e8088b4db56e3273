use minidex_core::Transaction;
use minidex_state::{LedgerState, Storage};

use crate::error::DexError;

/// Transaction validation result
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<DexError>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        ValidationResult {
            is_valid: true,
            error: None,
        }
    }

    pub fn err(error: DexError) -> Self {
        ValidationResult {
            is_valid: false,
            error: Some(error),
        }
    }
}

/// Check a transaction before execution.
///
/// Only the signature and the nonce are checked here. A transaction that
/// passes consumes its nonce whether or not its call succeeds.
pub fn validate_transaction<S: Storage>(
    tx: &Transaction,
    state: &LedgerState<S>,
) -> ValidationResult {
    if tx.verify_signature().is_err() {
        return ValidationResult::err(DexError::InvalidSignature);
    }

    let expected = state.nonce(&tx.sender());
    if tx.nonce != expected {
        return ValidationResult::err(DexError::InvalidNonce {
            expected,
            got: tx.nonce,
        });
    }

    ValidationResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use minidex_core::{Address, Call, KeyPair};
    use minidex_state::MemoryStorage;

    fn approve_call() -> Call {
        Call::Approve {
            token: Address([1; 20]),
            spender: Address([2; 20]),
            amount: 110,
        }
    }

    #[test]
    fn test_validate_valid_transaction() {
        let state = LedgerState::new(MemoryStorage::new(), 1);
        let sender = KeyPair::generate();

        let tx = Transaction::new_signed(0, approve_call(), &sender.secret).unwrap();

        let result = validate_transaction(&tx, &state);
        assert!(result.is_valid);
    }

    #[test]
    fn test_validate_invalid_signature() {
        let state = LedgerState::new(MemoryStorage::new(), 1);
        let sender = KeyPair::generate();
        let impostor = KeyPair::generate();

        let mut tx = Transaction::new_signed(0, approve_call(), &sender.secret).unwrap();
        tx.sender_pubkey = impostor.public;

        let result = validate_transaction(&tx, &state);
        assert!(!result.is_valid);
        assert!(matches!(result.error, Some(DexError::InvalidSignature)));
    }

    #[test]
    fn test_validate_invalid_nonce() {
        let mut state = LedgerState::new(MemoryStorage::new(), 1);
        let sender = KeyPair::generate();
        state.increment_nonce(&sender.address());

        let stale = Transaction::new_signed(0, approve_call(), &sender.secret).unwrap();
        let result = validate_transaction(&stale, &state);
        assert!(matches!(
            result.error,
            Some(DexError::InvalidNonce {
                expected: 1,
                got: 0
            })
        ));

        let ahead = Transaction::new_signed(5, approve_call(), &sender.secret).unwrap();
        assert!(!validate_transaction(&ahead, &state).is_valid);
    }
}
