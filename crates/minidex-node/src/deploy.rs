use std::path::Path;

use anyhow::{anyhow, bail, Result};
use minidex_core::{Address, Call, DeploymentRecord, KeyPair, DEFAULT_INITIAL_SUPPLY, MOCK_DECIMALS};
use tracing::info;

use crate::client::RpcClient;

/// Name and symbol of the two mock tokens, in deployment order
pub const MOCK_TOKENS: [(&str, &str); 2] = [("Mock USDC", "USDC"), ("Mock USDT", "USDT")];

pub fn load_record(path: &Path) -> Result<DeploymentRecord> {
    if !path.exists() {
        bail!(
            "Deployment record {} not found. Run deploy-tokens first.",
            path.display()
        );
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_record(path: &Path, record: &DeploymentRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(record)?)?;
    Ok(())
}

/// Read a field the deploy commands must already have written
pub fn required(value: Option<Address>, key: &str) -> Result<Address> {
    value.ok_or_else(|| anyhow!("Deployment record has no {} address", key))
}

/// Deploy both mock tokens and overwrite the record with their addresses
pub async fn deploy_tokens(
    client: &RpcClient,
    signer: &KeyPair,
    record_path: &Path,
) -> Result<DeploymentRecord> {
    let deployer = signer.address();
    info!("Deploying tokens with account: {}", deployer);

    let mut nonce = client.nonce(&deployer).await?;
    let mut addresses = Vec::with_capacity(MOCK_TOKENS.len());

    for (name, symbol) in MOCK_TOKENS {
        let call = Call::DeployToken {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals: MOCK_DECIMALS,
            initial_supply: DEFAULT_INITIAL_SUPPLY,
        };
        let address = client.deploy(signer, nonce, call).await?;
        nonce += 1;

        println!("{} deployed at: {}", symbol, address);
        addresses.push(address);
    }

    let record = DeploymentRecord {
        token_a: addresses.first().copied(),
        token_b: addresses.get(1).copied(),
        dex: None,
        deployer: Some(deployer),
    };
    save_record(record_path, &record)?;
    println!("Addresses saved to {}", record_path.display());

    Ok(record)
}

/// Deploy the exchange and add its address to the existing record
pub async fn deploy_dex(
    client: &RpcClient,
    signer: &KeyPair,
    record_path: &Path,
) -> Result<DeploymentRecord> {
    let mut record = load_record(record_path)?;
    let token_a = required(record.token_a, "tokenA")?;
    let token_b = required(record.token_b, "tokenB")?;

    let deployer = signer.address();
    info!("Deploying MinimalDex with account: {}", deployer);
    println!("Using token A: {}", token_a);
    println!("Using token B: {}", token_b);

    let nonce = client.nonce(&deployer).await?;
    let dex = client.deploy(signer, nonce, Call::DeployDex).await?;
    println!("MinimalDex deployed at: {}", dex);

    record.dex = Some(dex);
    save_record(record_path, &record)?;
    println!("Updated addresses saved to {}", record_path.display());

    Ok(record)
}
