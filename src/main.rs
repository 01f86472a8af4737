use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};

use trade_auth::clock::{Clock, SystemClock};
use trade_auth::config::AppConfig;
use trade_auth::db::init_database;
use trade_auth::external::{PaperBrokerage, RiskProfile, StaticRiskProvider};
use trade_auth::server::{start_server, ServerState};
use trade_auth::token_store::{EphemeralTokenStore, MemoryTokenStore, RedisTokenStore};
use trade_auth::trade_auth::{MaintenanceWorker, TradeAuthorizationOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("거래 승인 서비스 시작 중...");

    let config = AppConfig::from_env().context("설정 로드 실패")?;

    let pool = init_database(&config.server.database_url)
        .await
        .context("데이터베이스 초기화 실패")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let token_store: Arc<dyn EphemeralTokenStore> = match &config.server.redis_url {
        Some(url) => {
            let store = RedisTokenStore::new(url)
                .await
                .with_context(|| format!("Redis 연결 실패: {}", url))?;
            info!("✅ Redis 토큰 저장소 연결: {}", url);
            Arc::new(store)
        }
        None => {
            warn!("⚠️ REDIS_URL 미설정 - 프로세스 내 메모리 토큰 저장소 사용 (단일 인스턴스 전용)");
            Arc::new(MemoryTokenStore::new(clock.clone()))
        }
    };

    let orchestrator = Arc::new(TradeAuthorizationOrchestrator::new(
        pool,
        token_store,
        Arc::new(StaticRiskProvider::new(RiskProfile::default())),
        Arc::new(PaperBrokerage::new()),
        config.auth.clone(),
        clock,
    ));

    let worker = Arc::new(MaintenanceWorker::new(orchestrator.clone()));
    tokio::spawn(worker.run());

    start_server(&config.server, ServerState::new(orchestrator))
        .await
        .context("REST 서버 실행 실패")?;

    Ok(())
}
