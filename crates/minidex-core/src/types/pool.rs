use serde::{Deserialize, Serialize};

use crate::crypto::Address;
use crate::types::token::Amount;

/// Canonical key of a token pair: `token0 < token1` by address bytes.
///
/// `(X, Y)` and `(Y, X)` map to the same key, so both argument orders
/// address one economic pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub token0: Address,
    pub token1: Address,
}

impl PairKey {
    /// Build the canonical key; returns `None` for a same-token pair.
    pub fn new(token_x: Address, token_y: Address) -> Option<Self> {
        match token_x.cmp(&token_y) {
            std::cmp::Ordering::Less => Some(PairKey {
                token0: token_x,
                token1: token_y,
            }),
            std::cmp::Ordering::Greater => Some(PairKey {
                token0: token_y,
                token1: token_x,
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Whether `token` sits in the `token0` slot
    pub fn is_token0(&self, token: &Address) -> bool {
        self.token0 == *token
    }
}

/// Reserves of a pool stored in canonical (`token0`, `token1`) orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub reserve0: Amount,
    pub reserve1: Amount,
}

impl PoolReserves {
    pub fn is_empty(&self) -> bool {
        self.reserve0 == 0 && self.reserve1 == 0
    }

    /// View these reserves from the caller's argument order
    pub fn oriented(&self, key: &PairKey, token_x: &Address) -> LiquidityPool {
        if key.is_token0(token_x) {
            LiquidityPool {
                reserve_a: self.reserve0,
                reserve_b: self.reserve1,
            }
        } else {
            LiquidityPool {
                reserve_a: self.reserve1,
                reserve_b: self.reserve0,
            }
        }
    }

    /// Store reserves given in the caller's argument order
    pub fn set_oriented(&mut self, key: &PairKey, token_x: &Address, pool: LiquidityPool) {
        if key.is_token0(token_x) {
            self.reserve0 = pool.reserve_a;
            self.reserve1 = pool.reserve_b;
        } else {
            self.reserve0 = pool.reserve_b;
            self.reserve1 = pool.reserve_a;
        }
    }
}

/// Reserves of a pool as seen by a caller: `reserve_a` belongs to the first
/// token argument, `reserve_b` to the second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPool {
    pub reserve_a: Amount,
    pub reserve_b: Amount,
}

impl LiquidityPool {
    /// Both reserves zero: never funded
    pub fn is_uninitialized(&self) -> bool {
        self.reserve_a == 0 && self.reserve_b == 0
    }
}
