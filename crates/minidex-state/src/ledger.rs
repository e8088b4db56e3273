use std::collections::BTreeMap;

use minidex_core::{Address, Amount, LiquidityPool, PairKey, PoolReserves, TokenMeta};
use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Balances and allowances of one deployed token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
    pub meta: TokenMeta,
    balances: BTreeMap<Address, Amount>,
    /// (owner, spender) -> remaining allowance
    allowances: BTreeMap<(Address, Address), Amount>,
    /// When set, every transfer of this token reports failure
    pub fail_transfers: bool,
}

impl TokenLedger {
    /// A fresh token whose whole supply belongs to its owner
    pub fn new(meta: TokenMeta) -> Self {
        let mut balances = BTreeMap::new();
        if meta.total_supply > 0 {
            balances.insert(meta.owner, meta.total_supply);
        }
        TokenLedger {
            meta,
            balances,
            allowances: BTreeMap::new(),
            fail_transfers: false,
        }
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    pub fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    pub fn credit(&mut self, holder: &Address, amount: Amount) {
        let balance = self.balances.entry(*holder).or_insert(0);
        // Supply is fixed at deployment, so no balance can exceed it.
        *balance = balance.saturating_add(amount);
    }

    pub fn debit(&mut self, holder: &Address, amount: Amount) -> Result<(), StateError> {
        let have = self.balance_of(holder);
        if have < amount {
            return Err(StateError::InsufficientBalance { have, need: amount });
        }
        if have == amount {
            self.balances.remove(holder);
        } else {
            self.balances.insert(*holder, have - amount);
        }
        Ok(())
    }

    /// Number of accounts holding a non-zero balance
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }
}

/// A deployed AMM engine and its pool registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexInstance {
    pub address: Address,
    pub deployer: Address,
    pools: BTreeMap<PairKey, PoolReserves>,
}

impl DexInstance {
    pub fn new(address: Address, deployer: Address) -> Self {
        DexInstance {
            address,
            deployer,
            pools: BTreeMap::new(),
        }
    }

    /// Canonical reserves for `key`; zero if the pool was never funded
    pub fn reserves(&self, key: &PairKey) -> PoolReserves {
        self.pools.get(key).copied().unwrap_or_default()
    }

    /// The registry entry for `key`, `None` if the pair was never written
    pub fn entry(&self, key: &PairKey) -> Option<PoolReserves> {
        self.pools.get(key).copied()
    }

    pub fn set_reserves(&mut self, key: PairKey, reserves: PoolReserves) {
        self.pools.insert(key, reserves);
    }

    /// Put an entry back as captured by `entry`
    pub fn restore_entry(&mut self, key: PairKey, entry: Option<PoolReserves>) {
        match entry {
            Some(reserves) => {
                self.pools.insert(key, reserves);
            }
            None => {
                self.pools.remove(&key);
            }
        }
    }

    /// Number of pairs in the registry, funded or not
    pub fn entry_count(&self) -> usize {
        self.pools.len()
    }

    /// Reserves oriented to `(token_x, token_y)`; a same-token pair reads as empty
    pub fn pool(&self, token_x: &Address, token_y: &Address) -> LiquidityPool {
        match PairKey::new(*token_x, *token_y) {
            Some(key) => self.reserves(&key).oriented(&key, token_x),
            None => LiquidityPool::default(),
        }
    }

    /// Funded pools, in key order
    pub fn pools(&self) -> impl Iterator<Item = (&PairKey, &PoolReserves)> {
        self.pools.iter().filter(|(_, r)| !r.is_empty())
    }
}
