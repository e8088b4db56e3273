use serde::{Deserialize, Serialize};

use crate::crypto::{hash_blake3, sign, verify, Address, Hash, PublicKey, SecretKey, Sig};
use crate::error::CoreError;
use crate::serialize::{self, amount_str};
use crate::types::token::Amount;

/// A single state-changing call carried by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
    /// Deploy a mock fungible token; the whole supply goes to the sender
    DeployToken {
        name: String,
        symbol: String,
        decimals: u8,
        #[serde(with = "amount_str")]
        initial_supply: Amount,
    },
    /// Deploy an AMM engine instance with an empty pool registry
    DeployDex,
    /// Let `spender` move up to `amount` of the sender's `token`
    Approve {
        token: Address,
        spender: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    /// Move the sender's own tokens
    Transfer {
        token: Address,
        to: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    /// Move `from`'s tokens using the sender's allowance
    TransferFrom {
        token: Address,
        from: Address,
        to: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    /// Make every transfer of `token` fail (owner only)
    SetFailTransfers { token: Address, fail: bool },
    /// Deposit both sides of a pair into `dex`
    AddLiquidity {
        dex: Address,
        token_x: Address,
        token_y: Address,
        #[serde(with = "amount_str")]
        amount_x: Amount,
        #[serde(with = "amount_str")]
        amount_y: Amount,
    },
    /// Trade `amount_in` of `token_in` for `token_out` against `dex`
    Swap {
        dex: Address,
        token_in: Address,
        token_out: Address,
        #[serde(with = "amount_str")]
        amount_in: Amount,
    },
}

impl Call {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Call::DeployToken { .. } => "deploy_token",
            Call::DeployDex => "deploy_dex",
            Call::Approve { .. } => "approve",
            Call::Transfer { .. } => "transfer",
            Call::TransferFrom { .. } => "transfer_from",
            Call::SetFailTransfers { .. } => "set_fail_transfers",
            Call::AddLiquidity { .. } => "add_liquidity",
            Call::Swap { .. } => "swap",
        }
    }

    /// Whether the call creates a contract at the sender's current nonce
    pub fn is_deployment(&self) -> bool {
        matches!(self, Call::DeployToken { .. } | Call::DeployDex)
    }
}

/// A signed call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub sender_pubkey: PublicKey,
    /// Must equal the sender's executed transaction count
    pub nonce: u64,
    pub call: Call,
    /// Signature over the transaction (excluding this field)
    pub signature: Sig,
}

#[derive(Serialize)]
struct TransactionSigningData<'a> {
    sender_pubkey: &'a PublicKey,
    nonce: u64,
    call: &'a Call,
}

impl Transaction {
    pub fn new(sender_pubkey: PublicKey, nonce: u64, call: Call) -> Self {
        Transaction {
            sender_pubkey,
            nonce,
            call,
            signature: Sig::default(),
        }
    }

    pub fn signing_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serialize::to_bytes(&TransactionSigningData {
            sender_pubkey: &self.sender_pubkey,
            nonce: self.nonce,
            call: &self.call,
        })
    }

    pub fn sign(&mut self, secret_key: &SecretKey) -> Result<(), CoreError> {
        let bytes = self.signing_bytes()?;
        self.signature = sign(secret_key, &bytes);
        Ok(())
    }

    /// Create a transaction signed by `secret_key`, whose public key becomes the sender
    pub fn new_signed(nonce: u64, call: Call, secret_key: &SecretKey) -> Result<Self, CoreError> {
        let mut tx = Self::new(secret_key.public_key(), nonce, call);
        tx.sign(secret_key)?;
        Ok(tx)
    }

    pub fn verify_signature(&self) -> Result<(), CoreError> {
        let bytes = self.signing_bytes()?;
        verify(&self.sender_pubkey, &bytes, &self.signature)
    }

    pub fn sender(&self) -> Address {
        self.sender_pubkey.address()
    }

    pub fn hash(&self) -> Result<Hash, CoreError> {
        let bytes = serialize::to_bytes(self)?;
        Ok(hash_blake3(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn approve_call() -> Call {
        Call::Approve {
            token: Address([1; 20]),
            spender: Address([2; 20]),
            amount: 110,
        }
    }

    #[test]
    fn test_transaction_signing() {
        let sender = KeyPair::generate();
        let tx = Transaction::new_signed(0, approve_call(), &sender.secret).unwrap();

        assert!(tx.verify_signature().is_ok());
        assert_eq!(tx.sender(), sender.address());
    }

    #[test]
    fn test_tampered_call_fails_verification() {
        let sender = KeyPair::generate();
        let mut tx = Transaction::new_signed(0, approve_call(), &sender.secret).unwrap();

        tx.call = Call::Approve {
            token: Address([1; 20]),
            spender: Address([2; 20]),
            amount: u128::MAX,
        };

        assert!(tx.verify_signature().is_err());
    }

    #[test]
    fn test_transaction_json_roundtrip_keeps_signature_valid() {
        let sender = KeyPair::generate();
        let tx = Transaction::new_signed(
            3,
            Call::Swap {
                dex: Address([3; 20]),
                token_in: Address([1; 20]),
                token_out: Address([2; 20]),
                amount_in: 10_000_000_000_000_000_000,
            },
            &sender.secret,
        )
        .unwrap();

        let json = serde_json::to_string(&tx).unwrap();
        let decoded: Transaction = serde_json::from_str(&json).unwrap();

        assert!(decoded.verify_signature().is_ok());
        assert_eq!(decoded.hash().unwrap(), tx.hash().unwrap());
    }
}
