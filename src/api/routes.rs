use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::handlers::*;
use crate::server::ServerState;

/// API 라우터 생성
pub fn create_api_router() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))

        // 거래 승인 API
        .route("/v1/trade-authorizations", post(create_authorization))
        .route("/v1/trade-authorizations/:id", get(get_authorization))
        .route("/v1/trade-authorizations/:id/execute", post(execute_authorization))
        .route("/v1/trade-authorizations/:id/cancel", post(cancel_authorization))
        .route("/v1/trade-authorizations/:id/audit", get(get_audit_trail))

        // 거래 PIN API
        .route("/v1/trade-pin", put(set_trade_pin))
}
