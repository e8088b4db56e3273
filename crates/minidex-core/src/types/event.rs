use serde::{Deserialize, Serialize};

use crate::crypto::Address;
use crate::serialize::amount_str;
use crate::types::token::Amount;

/// Events emitted by token and DEX contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DexEvent {
    TokenDeployed {
        name: String,
        symbol: String,
        owner: Address,
    },
    DexDeployed {
        deployer: Address,
    },
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        #[serde(with = "amount_str")]
        amount: Amount,
    },
    FailTransfersSet {
        fail: bool,
    },
    LiquidityAdded {
        token_x: Address,
        token_y: Address,
        #[serde(with = "amount_str")]
        amount_x: Amount,
        #[serde(with = "amount_str")]
        amount_y: Amount,
    },
    Swapped {
        token_in: Address,
        token_out: Address,
        #[serde(with = "amount_str")]
        amount_in: Amount,
        #[serde(with = "amount_str")]
        amount_out: Amount,
    },
}

/// An event together with the contract that emitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    pub emitter: Address,
    pub event: DexEvent,
}

impl EventLog {
    pub fn new(emitter: Address, event: DexEvent) -> Self {
        EventLog { emitter, event }
    }
}
