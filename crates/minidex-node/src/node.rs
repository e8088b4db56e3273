use std::sync::Arc;

use anyhow::Result;
use minidex_rpc::ws::EventBroadcaster;
use minidex_rpc::{RpcConfig, RpcServer};
use minidex_state::{FileStorage, LedgerState};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::NodeConfig;

/// A single-process minidex node: one ledger served over RPC
pub struct Node {
    config: NodeConfig,
    ledger: Arc<RwLock<LedgerState<FileStorage>>>,
    broadcaster: Arc<EventBroadcaster>,
}

impl Node {
    /// Create a new node from configuration
    pub fn new(config: NodeConfig) -> Result<Self> {
        let storage = FileStorage::new(config.state_path())?;
        let ledger = Arc::new(RwLock::new(LedgerState::new(storage, config.chain_id)));

        Ok(Node {
            config,
            ledger,
            broadcaster: Arc::new(EventBroadcaster::default()),
        })
    }

    /// Load the persisted ledger if there is one, otherwise start empty
    pub async fn load_state(&self) -> Result<()> {
        let mut ledger = self.ledger.write().await;

        if !ledger.has_persisted_state() {
            info!("No persisted ledger in {:?}, starting empty", self.config.data_dir);
            return Ok(());
        }

        ledger.load_from_storage()?;
        if ledger.chain_id != self.config.chain_id {
            warn!(
                "Persisted chain id {} differs from configured {}",
                ledger.chain_id, self.config.chain_id
            );
        }
        Ok(())
    }

    /// Run the node until Ctrl-C
    pub async fn run(self) -> Result<()> {
        info!("Starting minidex node (chain id {})", self.config.chain_id);

        self.load_state().await?;

        let rpc_config = RpcConfig {
            http_addr: self.config.rpc_addr,
            enable_ws: self.config.enable_ws,
        };
        let rpc_server = RpcServer::new(
            rpc_config,
            Arc::clone(&self.ledger),
            Arc::clone(&self.broadcaster),
        );

        rpc_server
            .run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for shutdown signal: {}", e);
                }
            })
            .await?;

        info!("Shutting down, persisting ledger");
        self.ledger.write().await.persist_state()?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use minidex_rpc::ws::EventBroadcaster;
    use minidex_rpc::{RpcConfig, RpcServer};
    use minidex_state::{LedgerState, MemoryStorage};
    use tokio::sync::RwLock;

    /// Serve an in-memory ledger on an ephemeral port and return its base URL
    pub async fn spawn_local_node() -> String {
        let ledger = Arc::new(RwLock::new(LedgerState::new(MemoryStorage::new(), 31337)));
        let server = RpcServer::new(
            RpcConfig::default(),
            ledger,
            Arc::new(EventBroadcaster::default()),
        );
        let router = server.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://{}", addr)
    }

    pub fn temp_record_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("minidex-{}-{}", name, std::process::id()))
            .join("deployed_addresses.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minidex_core::{Call, KeyPair, Transaction, DEFAULT_INITIAL_SUPPLY};

    fn temp_config(name: &str) -> NodeConfig {
        let dir = std::env::temp_dir()
            .join(format!("minidex-node-{}-{}", name, std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        NodeConfig {
            data_dir: dir,
            ..NodeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_node_starts_empty() {
        let node = Node::new(temp_config("empty")).unwrap();
        node.load_state().await.unwrap();

        let ledger = node.ledger.read().await;
        assert_eq!(ledger.tx_count, 0);
        assert!(ledger.tokens.is_empty());
    }

    #[tokio::test]
    async fn test_node_reloads_persisted_ledger() {
        let config = temp_config("reload");
        let signer = KeyPair::generate();

        {
            let node = Node::new(config.clone()).unwrap();
            let mut ledger = node.ledger.write().await;
            let tx = Transaction::new_signed(
                0,
                Call::DeployToken {
                    name: "Mock USDC".to_string(),
                    symbol: "USDC".to_string(),
                    decimals: 18,
                    initial_supply: DEFAULT_INITIAL_SUPPLY,
                },
                &signer.secret,
            )
            .unwrap();
            let result = minidex_engine::Executor::new().execute_transaction(&tx, &mut ledger);
            assert!(result.success);
            ledger.persist_state().unwrap();
        }

        let node = Node::new(config.clone()).unwrap();
        node.load_state().await.unwrap();
        std::fs::remove_dir_all(&config.data_dir).ok();

        let ledger = node.ledger.read().await;
        assert_eq!(ledger.tx_count, 1);
        assert_eq!(ledger.nonce(&signer.address()), 1);
        assert_eq!(ledger.tokens.len(), 1);
    }
}
