use std::sync::Arc;

use axum::Router;
use log::info;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::create_api_router;
use crate::config::ServerConfig;
use crate::trade_auth::orchestrator::TradeAuthorizationOrchestrator;

/// 서버 상태
#[derive(Clone)]
pub struct ServerState {
    pub orchestrator: Arc<TradeAuthorizationOrchestrator>,
}

impl ServerState {
    pub fn new(orchestrator: Arc<TradeAuthorizationOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// 미들웨어가 적용된 라우터 생성
pub fn build_app(state: ServerState) -> Router {
    create_api_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 서버 시작
pub async fn start_server(config: &ServerConfig, state: ServerState) -> std::io::Result<()> {
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.rest_port)).await?;

    info!("🚀 거래 승인 서버가 시작되었습니다");
    info!("REST API: http://localhost:{}", config.rest_port);

    axum::serve(listener, app).await
}
