use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use minidex_engine::DexError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Dex(#[from] DexError),

    #[error("Core error: {0}")]
    Core(#[from] minidex_core::CoreError),

    #[error("State error: {0}")]
    State(#[from] minidex_state::StateError),
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RpcError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            RpcError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RpcError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            RpcError::Dex(e @ (DexError::UnknownDex(_) | DexError::UnknownToken(_))) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            RpcError::Dex(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            RpcError::Core(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            RpcError::State(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}
