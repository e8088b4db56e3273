use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use minidex_core::{KeyPair, SecretKey};
use serde::{Deserialize, Serialize};

/// Environment variable holding the operator's hex Ed25519 seed
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Environment variable holding the explorer API key
pub const EXPLORER_API_KEY_ENV: &str = "EXPLORER_API_KEY";

const DUMMY_API_KEY: &str = "DUMMY_KEY";

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Chain ID
    pub chain_id: u64,

    /// Node data directory
    pub data_dir: PathBuf,

    /// RPC bind address
    pub rpc_addr: SocketAddr,

    /// Enable WebSocket
    pub enable_ws: bool,

    /// Deployment record written by the deploy commands
    pub deployments_path: PathBuf,

    /// Nodes the operator commands can target, by name
    pub networks: BTreeMap<String, NetworkConfig>,
}

/// Endpoint of a network the operator commands can target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,

    /// Source verification endpoint; `verify` fails without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(
            "localhost".to_string(),
            NetworkConfig {
                rpc_url: "http://127.0.0.1:8545".to_string(),
                explorer_url: None,
            },
        );

        NodeConfig {
            chain_id: 31337,
            data_dir: PathBuf::from("./minidex-data"),
            rpc_addr: SocketAddr::from(([127, 0, 0, 1], 8545)),
            enable_ws: true,
            deployments_path: PathBuf::from("deployments/deployed_addresses.json"),
            networks,
        }
    }
}

impl NodeConfig {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: NodeConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load config from file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig> {
        self.networks
            .get(name)
            .ok_or_else(|| anyhow!("Unknown network '{}'", name))
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.bin")
    }
}

/// Generate a sample configuration with a local network and an example remote one
pub fn generate_sample_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.networks.insert(
        "testnet".to_string(),
        NetworkConfig {
            rpc_url: "http://127.0.0.1:9545".to_string(),
            explorer_url: Some("http://127.0.0.1:9600/api/verify".to_string()),
        },
    );
    config
}

/// The operator identity from `PRIVATE_KEY`
pub fn signer_from_env() -> Result<KeyPair> {
    match std::env::var(PRIVATE_KEY_ENV) {
        Ok(hex) if !hex.trim().is_empty() => signer_from_hex(&hex),
        _ => bail!("{} is not set", PRIVATE_KEY_ENV),
    }
}

fn signer_from_hex(hex: &str) -> Result<KeyPair> {
    let secret = SecretKey::from_hex(hex)
        .map_err(|e| anyhow!("{} is not a valid Ed25519 seed: {}", PRIVATE_KEY_ENV, e))?;
    Ok(KeyPair::from_secret(secret))
}

/// The explorer API key from `EXPLORER_API_KEY`
pub fn explorer_api_key() -> String {
    std::env::var(EXPLORER_API_KEY_ENV).unwrap_or_else(|_| DUMMY_API_KEY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.chain_id, 31337);
        assert_eq!(
            config.network("localhost").unwrap().rpc_url,
            "http://127.0.0.1:8545"
        );
        assert!(config.network("mainnet").is_err());
    }

    #[test]
    fn test_sample_config_roundtrip() {
        let config = generate_sample_config();
        let path = std::env::temp_dir().join(format!("minidex-config-{}.json", std::process::id()));

        config.save(&path).unwrap();
        let loaded = NodeConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.networks, config.networks);
        assert_eq!(loaded.deployments_path, config.deployments_path);
        assert!(loaded.network("testnet").unwrap().explorer_url.is_some());
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let config = NodeConfig::load_or_default(Path::new("/nonexistent/minidex.json")).unwrap();
        assert_eq!(config.rpc_addr, NodeConfig::default().rpc_addr);
    }

    #[test]
    fn test_signer_from_hex() {
        let kp = KeyPair::generate();
        let signer = signer_from_hex(&format!("0x{}", kp.secret.to_hex())).unwrap();
        assert_eq!(signer.address(), kp.address());
        assert!(signer_from_hex("not-hex").is_err());
    }
}
