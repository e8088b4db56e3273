use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use minidex_state::Storage;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    get_account, get_allowance, get_balance, get_contract, get_pool, get_quote, get_status,
    get_token, submit_tx, AppState,
};

/// Create the HTTP router
pub fn create_router<S: Storage + Send + Sync + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/status", get(get_status::<S>))
        .route("/tx", post(submit_tx::<S>))
        .route("/account/{address}", get(get_account::<S>))
        .route("/token/{address}", get(get_token::<S>))
        .route("/token/{address}/balance/{holder}", get(get_balance::<S>))
        .route(
            "/token/{address}/allowance/{owner}/{spender}",
            get(get_allowance::<S>),
        )
        .route("/dex/{address}/pool/{token_x}/{token_y}", get(get_pool::<S>))
        .route(
            "/dex/{address}/quote/{token_in}/{token_out}/{amount_in}",
            get(get_quote::<S>),
        )
        .route("/contract/{address}", get(get_contract::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
