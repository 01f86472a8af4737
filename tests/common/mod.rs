//! 통합 테스트 공용 하네스
//!
//! 인메모리 SQLite + 메모리 토큰 저장소 + 수동 시계 + 스크립트 브로커로
//! 오케스트레이터를 구성합니다.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePool;
use tokio::sync::Mutex;
use uuid::Uuid;

use trade_auth::clock::{Clock, ManualClock};
use trade_auth::config::AuthConfig;
use trade_auth::db::models::BrokerageConnectionRecord;
use trade_auth::db::{init_database, BrokerageConnectionRepository};
use trade_auth::external::{
    BrokerageClient, BrokerageFill, BrokerageOrderRequest, ExternalError, RiskProfile,
    StaticRiskProvider,
};
use trade_auth::token_store::MemoryTokenStore;
use trade_auth::trade_auth::{AuthorizeRequest, OrderType, Side, TradeAuthorizationOrchestrator};

pub const USER: &str = "user-1";
pub const CONNECTION: &str = "conn-1";
pub const START_MS: i64 = 1_700_000_000_000;

/// 브로커 응답 시나리오
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerMode {
    /// 정상 체결
    Fill,
    /// 주문 거부 (체결 없음)
    Reject,
    /// 체결은 되었으나 응답 유실 (타임아웃으로 보임)
    LoseResponse,
    /// 응답 지연
    Hang,
}

/// 스크립트 브로커
pub struct ScriptedBrokerage {
    mode: Mutex<BrokerMode>,
    price: Decimal,
    fills: Mutex<HashMap<String, BrokerageFill>>,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<BrokerageOrderRequest>>,
}

impl ScriptedBrokerage {
    pub fn new(mode: BrokerMode, price: Decimal) -> Self {
        Self {
            mode: Mutex::new(mode),
            price,
            fills: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub async fn set_mode(&self, mode: BrokerMode) {
        *self.mode.lock().await = mode;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fill_for(&self, request: &BrokerageOrderRequest) -> BrokerageFill {
        BrokerageFill {
            broker_order_id: format!("BRK-{}", Uuid::new_v4()),
            fill_price: request.limit_price.unwrap_or(self.price),
            filled_quantity: request.quantity,
        }
    }
}

#[async_trait]
impl BrokerageClient for ScriptedBrokerage {
    async fn place_order(&self, request: &BrokerageOrderRequest) -> Result<BrokerageFill, ExternalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().await = Some(request.clone());

        let mode = *self.mode.lock().await;
        match mode {
            BrokerMode::Fill => {
                let fill = self.fill_for(request);
                self.fills
                    .lock()
                    .await
                    .insert(request.client_order_id.clone(), fill.clone());
                Ok(fill)
            }
            BrokerMode::Reject => Err(ExternalError::Rejected("insufficient buying power".into())),
            BrokerMode::LoseResponse => {
                let fill = self.fill_for(request);
                self.fills
                    .lock()
                    .await
                    .insert(request.client_order_id.clone(), fill);
                Err(ExternalError::Timeout(10_000))
            }
            BrokerMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(ExternalError::Unavailable("unreachable".into()))
            }
        }
    }

    async fn find_order(&self, client_order_id: &str) -> Result<Option<BrokerageFill>, ExternalError> {
        Ok(self.fills.lock().await.get(client_order_id).cloned())
    }
}

/// 테스트 하네스
pub struct Harness {
    pub orchestrator: Arc<TradeAuthorizationOrchestrator>,
    pub pool: SqlitePool,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryTokenStore>,
    pub risk: Arc<StaticRiskProvider>,
    pub brokerage: Arc<ScriptedBrokerage>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(AuthConfig::default(), BrokerMode::Fill).await
    }

    pub async fn with_broker(mode: BrokerMode) -> Self {
        Self::with_config(AuthConfig::default(), mode).await
    }

    pub async fn with_config(config: AuthConfig, mode: BrokerMode) -> Self {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let clock = Arc::new(ManualClock::new(START_MS));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let store = Arc::new(MemoryTokenStore::new(dyn_clock.clone()));
        let risk = Arc::new(StaticRiskProvider::new(RiskProfile::default()));
        let brokerage = Arc::new(ScriptedBrokerage::new(mode, Decimal::new(15025, 2)));

        let orchestrator = Arc::new(TradeAuthorizationOrchestrator::new(
            pool.clone(),
            store.clone(),
            risk.clone(),
            brokerage.clone(),
            config,
            dyn_clock,
        ));

        add_connection(&pool, CONNECTION, USER, "active").await;

        Self {
            orchestrator,
            pool,
            clock,
            store,
            risk,
            brokerage,
        }
    }

    /// 기본 주문: ABCD 10주 시장가 매수
    pub fn buy_request(&self) -> AuthorizeRequest {
        AuthorizeRequest {
            user_id: USER.to_string(),
            brokerage_connection_id: CONNECTION.to_string(),
            symbol: "ABCD".to_string(),
            side: Side::Buy,
            quantity: Decimal::from(10),
            order_type: OrderType::Market,
            limit_price: None,
        }
    }

    /// 영속 계층에 저장된 텍스트 전체 (비밀값 노출 검사용)
    pub async fn persisted_text(&self) -> String {
        let authorizations: Vec<(String, String, String, Option<String>)> = sqlx::query_as(
            "SELECT id, auth_token_hash, symbol, error_message FROM trade_authorizations",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap();
        let audits: Vec<(String, String)> =
            sqlx::query_as("SELECT action, details FROM trade_audit_log")
                .fetch_all(&self.pool)
                .await
                .unwrap();

        let mut text = String::new();
        for (id, hash, symbol, error) in authorizations {
            text.push_str(&format!("{}|{}|{}|{:?}\n", id, hash, symbol, error));
        }
        for (action, details) in audits {
            text.push_str(&format!("{}|{}\n", action, details));
        }
        text
    }

    /// 승인별 감사 액션 목록 (기록 순)
    pub async fn audit_actions(&self, trade_authorization_id: &str) -> Vec<String> {
        sqlx::query_as::<_, (String,)>(
            "SELECT action FROM trade_audit_log WHERE trade_authorization_id = ? ORDER BY id ASC",
        )
        .bind(trade_authorization_id)
        .fetch_all(&self.pool)
        .await
        .unwrap()
        .into_iter()
        .map(|(action,)| action)
        .collect()
    }

    pub async fn status_of(&self, trade_authorization_id: &str) -> String {
        let (status,): (String,) =
            sqlx::query_as("SELECT status FROM trade_authorizations WHERE id = ?")
                .bind(trade_authorization_id)
                .fetch_one(&self.pool)
                .await
                .unwrap();
        status
    }
}

pub async fn add_connection(pool: &SqlitePool, id: &str, user_id: &str, status: &str) {
    BrokerageConnectionRepository::new(pool.clone())
        .upsert(&BrokerageConnectionRecord {
            id: id.to_string(),
            user_id: user_id.to_string(),
            broker_name: "paper".to_string(),
            status: status.to_string(),
            created_at: START_MS,
        })
        .await
        .unwrap();
}
