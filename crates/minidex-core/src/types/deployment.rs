use serde::{Deserialize, Serialize};

use crate::crypto::{hash_parts, Address, Hash};

/// Addresses written by the deploy commands and read by `interact` and `verify`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_a: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_b: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dex: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployer: Option<Address>,
}

/// What kind of contract lives at an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    MockToken,
    MinimalDex,
}

impl ContractKind {
    /// Contract name submitted for source verification
    pub fn contract_name(&self) -> &'static str {
        match self {
            ContractKind::MockToken => "MockERC20",
            ContractKind::MinimalDex => "MinimalDex",
        }
    }

    /// Identifier of the executable behind this kind of contract
    pub fn code_hash(&self) -> Hash {
        hash_parts(&[
            b"minidex-code",
            self.contract_name().as_bytes(),
            env!("CARGO_PKG_VERSION").as_bytes(),
        ])
    }
}

/// Deployment metadata of a contract, as needed for source verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub address: Address,
    pub kind: ContractKind,
    pub deployer: Address,
    pub constructor_args: Vec<String>,
    pub code_hash: Hash,
}
