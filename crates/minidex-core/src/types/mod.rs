pub mod deployment;
pub mod event;
pub mod pool;
pub mod token;
pub mod transaction;

pub use deployment::{ContractInfo, ContractKind, DeploymentRecord};
pub use event::{DexEvent, EventLog};
pub use pool::{LiquidityPool, PairKey, PoolReserves};
pub use token::{
    format_units, parse_units, Amount, TokenMeta, DEFAULT_INITIAL_SUPPLY, MOCK_DECIMALS,
};
pub use transaction::{Call, Transaction};
