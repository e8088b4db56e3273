//! Minidex RPC - HTTP and WebSocket API
//!
//! Serves the ledger over HTTP: signed transactions are executed under the
//! ledger's write lock, reads take the read lock. Emitted contract events
//! are pushed to WebSocket subscribers.

pub mod error;
pub mod http;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use minidex_engine::Executor;
use minidex_state::{LedgerState, Storage};
use tokio::sync::RwLock;
use tracing::info;

use http::{create_router, AppState};
use ws::{create_ws_router, EventBroadcaster};

pub use error::RpcError;
pub use http::handlers::{
    AccountResponse, AllowanceResponse, BalanceResponse, ContractResponse, PoolResponse,
    QuoteResponse, StatusResponse, TokenResponse, TxResponse, TxSubmitRequest,
};
pub use ws::{Subscription, WsEvent};

/// RPC server configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// HTTP bind address
    pub http_addr: SocketAddr,
    /// Enable WebSocket
    pub enable_ws: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        RpcConfig {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 8545)),
            enable_ws: true,
        }
    }
}

/// RPC server
pub struct RpcServer<S: Storage> {
    config: RpcConfig,
    app_state: Arc<AppState<S>>,
}

impl<S: Storage + Send + Sync + 'static> RpcServer<S> {
    pub fn new(
        config: RpcConfig,
        ledger: Arc<RwLock<LedgerState<S>>>,
        broadcaster: Arc<EventBroadcaster>,
    ) -> Self {
        let app_state = Arc::new(AppState {
            ledger,
            broadcaster,
            executor: Executor::new(),
        });

        RpcServer { config, app_state }
    }

    pub fn broadcaster(&self) -> Arc<EventBroadcaster> {
        Arc::clone(&self.app_state.broadcaster)
    }

    /// Create the combined router
    pub fn router(&self) -> Router {
        let http_router = create_router(Arc::clone(&self.app_state));

        if self.config.enable_ws {
            let ws_router = create_ws_router(Arc::clone(&self.app_state.broadcaster));
            http_router.merge(ws_router)
        } else {
            http_router
        }
    }

    /// Run the RPC server until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let addr = self.config.http_addr;

        info!("Starting RPC server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
