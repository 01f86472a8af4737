pub mod models;
pub mod repository;

use log::info;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Error as SqlxError;

pub use repository::{
    AuditLogRepository, AuthorizationRepository, BrokerageConnectionRepository, PinRepository,
};

/// SQLite 데이터베이스 초기화 및 연결
pub async fn init_database(database_url: &str) -> Result<SqlitePool, SqlxError> {
    info!("🗄️  SQLite 데이터베이스 초기화 중...");

    // 인메모리 DB는 연결마다 별도 DB가 되므로 연결 하나를 계속 유지
    let in_memory = database_url.contains(":memory:");
    let options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    // 연결 풀 생성
    let pool = options.connect(database_url).await?;

    // 테이블 생성
    create_tables(&pool).await?;

    info!("✅ 데이터베이스 초기화 완료");

    Ok(pool)
}

/// 필요한 테이블 생성
async fn create_tables(pool: &SqlitePool) -> Result<(), SqlxError> {
    // 거래 승인 테이블
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS trade_authorizations (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            brokerage_connection_id TEXT NOT NULL,
            symbol TEXT NOT NULL,
            side TEXT NOT NULL CHECK (side IN ('BUY', 'SELL')),
            quantity TEXT NOT NULL,
            order_type TEXT NOT NULL CHECK (order_type IN ('market', 'limit', 'stop', 'stop_limit')),
            limit_price TEXT,
            auth_token_hash TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'confirmed', 'executed', 'expired', 'cancelled')),
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL,
            confirmed_at INTEGER,
            executed_at INTEGER,
            executed_price TEXT,
            executed_quantity TEXT,
            broker_order_id TEXT,
            error_message TEXT,
            reconcile_checked_at INTEGER
        )"
    )
    .execute(pool)
    .await?;

    // 거래 PIN 테이블
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_trade_pins (
            user_id TEXT PRIMARY KEY,
            pin_hash TEXT NOT NULL,
            failed_attempts INTEGER NOT NULL DEFAULT 0 CHECK (failed_attempts >= 0),
            locked_until INTEGER,
            updated_at INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    // 감사 로그 테이블 (추가 전용)
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS trade_audit_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trade_authorization_id TEXT,
            user_id TEXT NOT NULL,
            action TEXT NOT NULL,
            details TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    // 브로커 연결 테이블
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS brokerage_connections (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            broker_name TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    // 인덱스 생성
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trade_auth_status_expires ON trade_authorizations(status, expires_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trade_auth_user ON trade_authorizations(user_id, created_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trade_auth_reconcile ON trade_authorizations(status, reconcile_checked_at, confirmed_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_audit_auth ON trade_audit_log(trade_authorization_id)")
        .execute(pool)
        .await?;

    info!("📋 테이블 생성 완료");

    Ok(())
}
