use std::collections::BTreeMap;

use minidex_core::{serialize, Address, ContractInfo, PairKey, PoolReserves};
use tracing::{debug, info};

use crate::error::StateError;
use crate::ledger::{DexInstance, TokenLedger};
use crate::storage::Storage;

/// Key prefixes for storage
mod keys {
    pub const TOKEN: &[u8] = b"tok:";
    pub const DEX: &[u8] = b"dex:";
    pub const NONCE: &[u8] = b"nonce:";
    pub const CONTRACT: &[u8] = b"contract:";
    pub const CHAIN_ID: &[u8] = b"chain:id";
    pub const TX_COUNT: &[u8] = b"chain:txcount";
}

/// Saved copy of everything one contract call may touch.
///
/// Restoring it undoes the call in full, so a failed liquidity deposit or
/// swap leaves no partial balance or reserve change behind.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    tokens: Vec<(Address, Option<TokenLedger>)>,
    pool: Option<(Address, PairKey, Option<PoolReserves>)>,
}

/// Token ledgers, DEX registries, account nonces and contract metadata
pub struct LedgerState<S: Storage> {
    storage: S,
    pub chain_id: u64,
    pub tokens: BTreeMap<Address, TokenLedger>,
    pub dexes: BTreeMap<Address, DexInstance>,
    /// Executed transaction count per sender; doubles as the next expected nonce
    pub nonces: BTreeMap<Address, u64>,
    pub contracts: BTreeMap<Address, ContractInfo>,
    /// Transactions executed since the ledger was created
    pub tx_count: u64,
}

impl<S: Storage + Clone> Clone for LedgerState<S> {
    fn clone(&self) -> Self {
        LedgerState {
            storage: self.storage.clone(),
            chain_id: self.chain_id,
            tokens: self.tokens.clone(),
            dexes: self.dexes.clone(),
            nonces: self.nonces.clone(),
            contracts: self.contracts.clone(),
            tx_count: self.tx_count,
        }
    }
}

impl<S: Storage> LedgerState<S> {
    pub fn new(storage: S, chain_id: u64) -> Self {
        LedgerState {
            storage,
            chain_id,
            tokens: BTreeMap::new(),
            dexes: BTreeMap::new(),
            nonces: BTreeMap::new(),
            contracts: BTreeMap::new(),
            tx_count: 0,
        }
    }

    /// Next nonce `address` must sign with
    pub fn nonce(&self, address: &Address) -> u64 {
        self.nonces.get(address).copied().unwrap_or(0)
    }

    pub fn increment_nonce(&mut self, address: &Address) {
        *self.nonces.entry(*address).or_insert(0) += 1;
        self.tx_count += 1;
    }

    fn claim_address(&self, address: &Address) -> Result<(), StateError> {
        if self.contracts.contains_key(address) {
            return Err(StateError::ContractExists(address.to_hex()));
        }
        Ok(())
    }

    /// Register a freshly deployed token together with its metadata
    pub fn add_token(&mut self, ledger: TokenLedger, info: ContractInfo) -> Result<(), StateError> {
        let address = ledger.meta.address;
        self.claim_address(&address)?;
        debug!("Registered token {} ({})", ledger.meta.symbol, address);
        self.tokens.insert(address, ledger);
        self.contracts.insert(address, info);
        Ok(())
    }

    /// Register a freshly deployed DEX together with its metadata
    pub fn add_dex(&mut self, dex: DexInstance, info: ContractInfo) -> Result<(), StateError> {
        let address = dex.address;
        self.claim_address(&address)?;
        debug!("Registered dex {}", address);
        self.dexes.insert(address, dex);
        self.contracts.insert(address, info);
        Ok(())
    }

    pub fn get_token(&self, address: &Address) -> Option<&TokenLedger> {
        self.tokens.get(address)
    }

    pub fn get_token_mut(&mut self, address: &Address) -> Result<&mut TokenLedger, StateError> {
        self.tokens
            .get_mut(address)
            .ok_or_else(|| StateError::TokenNotFound(address.to_hex()))
    }

    pub fn get_dex(&self, address: &Address) -> Option<&DexInstance> {
        self.dexes.get(address)
    }

    pub fn get_dex_mut(&mut self, address: &Address) -> Result<&mut DexInstance, StateError> {
        self.dexes
            .get_mut(address)
            .ok_or_else(|| StateError::DexNotFound(address.to_hex()))
    }

    pub fn get_contract(&self, address: &Address) -> Option<&ContractInfo> {
        self.contracts.get(address)
    }

    /// Snapshot the given token ledgers and, optionally, one pool
    pub fn checkpoint(&self, tokens: &[Address], pool: Option<(Address, PairKey)>) -> Checkpoint {
        let tokens = tokens
            .iter()
            .map(|addr| (*addr, self.tokens.get(addr).cloned()))
            .collect();
        let pool = pool.and_then(|(dex, key)| {
            self.dexes
                .get(&dex)
                .map(|instance| (dex, key, instance.entry(&key)))
        });
        Checkpoint { tokens, pool }
    }

    /// Put back everything captured by `checkpoint`
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        for (address, ledger) in checkpoint.tokens {
            match ledger {
                Some(ledger) => {
                    self.tokens.insert(address, ledger);
                }
                None => {
                    self.tokens.remove(&address);
                }
            }
        }
        if let Some((dex, key, entry)) = checkpoint.pool {
            if let Some(instance) = self.dexes.get_mut(&dex) {
                instance.restore_entry(key, entry);
            }
        }
        debug!("Restored ledger checkpoint");
    }

    /// Write the in-memory ledger to storage and commit
    pub fn persist_state(&mut self) -> Result<(), StateError> {
        for (address, ledger) in &self.tokens {
            let key = [keys::TOKEN, address.as_bytes()].concat();
            let value =
                serialize::to_bytes(ledger).map_err(|e| StateError::Serialization(e.to_string()))?;
            self.storage.put(&key, &value);
        }

        for (address, dex) in &self.dexes {
            let key = [keys::DEX, address.as_bytes()].concat();
            let value =
                serialize::to_bytes(dex).map_err(|e| StateError::Serialization(e.to_string()))?;
            self.storage.put(&key, &value);
        }

        for (address, nonce) in &self.nonces {
            let key = [keys::NONCE, address.as_bytes()].concat();
            self.storage.put(&key, &nonce.to_le_bytes());
        }

        for (address, info) in &self.contracts {
            let key = [keys::CONTRACT, address.as_bytes()].concat();
            let value =
                serialize::to_bytes(info).map_err(|e| StateError::Serialization(e.to_string()))?;
            self.storage.put(&key, &value);
        }

        self.storage.put(keys::CHAIN_ID, &self.chain_id.to_le_bytes());
        self.storage.put(keys::TX_COUNT, &self.tx_count.to_le_bytes());

        self.storage.commit()?;
        debug!(
            "Persisted {} tokens, {} dexes, {} accounts",
            self.tokens.len(),
            self.dexes.len(),
            self.nonces.len()
        );
        Ok(())
    }

    /// Replace the in-memory ledger with what storage holds
    pub fn load_from_storage(&mut self) -> Result<(), StateError> {
        self.tokens.clear();
        self.dexes.clear();
        self.nonces.clear();
        self.contracts.clear();
        self.tx_count = 0;

        for key in self.storage.keys_with_prefix(keys::TOKEN) {
            if let Some(value) = self.storage.get(&key) {
                if let Some(address) = Address::from_slice(&key[keys::TOKEN.len()..]) {
                    let ledger = serialize::from_bytes(&value)
                        .map_err(|e| StateError::Serialization(e.to_string()))?;
                    self.tokens.insert(address, ledger);
                }
            }
        }

        for key in self.storage.keys_with_prefix(keys::DEX) {
            if let Some(value) = self.storage.get(&key) {
                if let Some(address) = Address::from_slice(&key[keys::DEX.len()..]) {
                    let dex = serialize::from_bytes(&value)
                        .map_err(|e| StateError::Serialization(e.to_string()))?;
                    self.dexes.insert(address, dex);
                }
            }
        }

        for key in self.storage.keys_with_prefix(keys::NONCE) {
            if let (Some(value), Some(address)) = (
                self.storage.get(&key),
                Address::from_slice(&key[keys::NONCE.len()..]),
            ) {
                self.nonces.insert(address, read_u64(&value)?);
            }
        }

        for key in self.storage.keys_with_prefix(keys::CONTRACT) {
            if let Some(value) = self.storage.get(&key) {
                if let Some(address) = Address::from_slice(&key[keys::CONTRACT.len()..]) {
                    let info = serialize::from_bytes(&value)
                        .map_err(|e| StateError::Serialization(e.to_string()))?;
                    self.contracts.insert(address, info);
                }
            }
        }

        if let Some(value) = self.storage.get(keys::CHAIN_ID) {
            self.chain_id = read_u64(&value)?;
        }
        if let Some(value) = self.storage.get(keys::TX_COUNT) {
            self.tx_count = read_u64(&value)?;
        }

        info!(
            "Loaded ledger: {} tokens, {} dexes, {} transactions",
            self.tokens.len(),
            self.dexes.len(),
            self.tx_count
        );
        Ok(())
    }

    /// Whether storage holds a previously persisted ledger
    pub fn has_persisted_state(&self) -> bool {
        self.storage.exists(keys::CHAIN_ID)
    }
}

fn read_u64(bytes: &[u8]) -> Result<u64, StateError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StateError::Serialization(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_le_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use minidex_core::{ContractKind, TokenMeta};

    fn create_test_state() -> LedgerState<MemoryStorage> {
        LedgerState::new(MemoryStorage::new(), 31337)
    }

    fn deploy_token(state: &mut LedgerState<MemoryStorage>, seed: u8, owner: Address) -> Address {
        let address = Address([seed; 20]);
        let meta = TokenMeta {
            address,
            name: format!("Token {}", seed),
            symbol: format!("T{}", seed),
            decimals: 18,
            total_supply: 1_000,
            owner,
        };
        let info = ContractInfo {
            address,
            kind: ContractKind::MockToken,
            deployer: owner,
            constructor_args: meta.constructor_args(),
            code_hash: ContractKind::MockToken.code_hash(),
        };
        state.add_token(TokenLedger::new(meta), info).unwrap();
        address
    }

    fn deploy_dex(state: &mut LedgerState<MemoryStorage>, seed: u8, owner: Address) -> Address {
        let address = Address([seed; 20]);
        let info = ContractInfo {
            address,
            kind: ContractKind::MinimalDex,
            deployer: owner,
            constructor_args: Vec::new(),
            code_hash: ContractKind::MinimalDex.code_hash(),
        };
        state.add_dex(DexInstance::new(address, owner), info).unwrap();
        address
    }

    #[test]
    fn test_nonce_starts_at_zero() {
        let mut state = create_test_state();
        let alice = Address([1; 20]);

        assert_eq!(state.nonce(&alice), 0);
        state.increment_nonce(&alice);
        state.increment_nonce(&alice);
        assert_eq!(state.nonce(&alice), 2);
        assert_eq!(state.tx_count, 2);
    }

    #[test]
    fn test_contract_address_cannot_be_reused() {
        let mut state = create_test_state();
        let owner = Address([1; 20]);
        let token = deploy_token(&mut state, 10, owner);

        let result = state.add_dex(
            DexInstance::new(token, owner),
            ContractInfo {
                address: token,
                kind: ContractKind::MinimalDex,
                deployer: owner,
                constructor_args: Vec::new(),
                code_hash: ContractKind::MinimalDex.code_hash(),
            },
        );
        assert!(matches!(result, Err(StateError::ContractExists(_))));
        assert!(state.get_dex(&token).is_none());
    }

    #[test]
    fn test_restore_undoes_token_and_pool_changes() {
        let mut state = create_test_state();
        let owner = Address([1; 20]);
        let bob = Address([2; 20]);
        let token_a = deploy_token(&mut state, 10, owner);
        let token_b = deploy_token(&mut state, 11, owner);
        let dex = deploy_dex(&mut state, 12, owner);
        let key = PairKey::new(token_a, token_b).unwrap();

        let checkpoint = state.checkpoint(&[token_a, token_b], Some((dex, key)));

        let ledger = state.get_token_mut(&token_a).unwrap();
        ledger.debit(&owner, 300).unwrap();
        ledger.credit(&bob, 300);
        state.get_dex_mut(&dex).unwrap().set_reserves(
            key,
            PoolReserves {
                reserve0: 5,
                reserve1: 7,
            },
        );

        state.restore(checkpoint);

        assert_eq!(state.get_token(&token_a).unwrap().balance_of(&owner), 1_000);
        assert_eq!(state.get_token(&token_a).unwrap().balance_of(&bob), 0);
        assert!(state.get_dex(&dex).unwrap().reserves(&key).is_empty());
    }

    #[test]
    fn test_restore_drops_pool_entry_created_by_failed_call() {
        let mut state = create_test_state();
        let owner = Address([1; 20]);
        let token_a = deploy_token(&mut state, 10, owner);
        let token_b = deploy_token(&mut state, 11, owner);
        let dex = deploy_dex(&mut state, 12, owner);
        let key = PairKey::new(token_a, token_b).unwrap();

        let checkpoint = state.checkpoint(&[token_a, token_b], Some((dex, key)));
        state
            .get_dex_mut(&dex)
            .unwrap()
            .set_reserves(key, PoolReserves::default());
        state.restore(checkpoint);

        let instance = state.get_dex(&dex).unwrap();
        assert_eq!(instance.entry(&key), None);
        assert_eq!(instance.entry_count(), 0);
        assert_eq!(
            serialize::to_bytes(instance).unwrap(),
            serialize::to_bytes(&DexInstance::new(dex, owner)).unwrap()
        );
    }

    #[test]
    fn test_persist_and_reload() {
        let mut state = create_test_state();
        let owner = Address([1; 20]);
        let token_a = deploy_token(&mut state, 10, owner);
        let token_b = deploy_token(&mut state, 11, owner);
        let dex = deploy_dex(&mut state, 12, owner);
        let key = PairKey::new(token_a, token_b).unwrap();
        state.get_dex_mut(&dex).unwrap().set_reserves(
            key,
            PoolReserves {
                reserve0: 100,
                reserve1: 50,
            },
        );
        state.increment_nonce(&owner);
        state.persist_state().unwrap();

        let mut reloaded = LedgerState::new(state.storage.clone(), 0);
        assert!(reloaded.has_persisted_state());
        reloaded.load_from_storage().unwrap();

        assert_eq!(reloaded.chain_id, 31337);
        assert_eq!(reloaded.tx_count, 1);
        assert_eq!(reloaded.nonce(&owner), 1);
        assert_eq!(reloaded.tokens, state.tokens);
        assert_eq!(reloaded.dexes, state.dexes);
        assert_eq!(
            reloaded.get_contract(&dex).map(|c| c.kind),
            Some(ContractKind::MinimalDex)
        );
    }
}
