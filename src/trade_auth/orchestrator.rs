//! 거래 승인 오케스트레이터
//!
//! 2단계 프로토콜을 구동합니다.
//! 1. `authorize`: 검증 → 브로커 연결/리스크 확인 → pending 행 + 감사 로그 (한 트랜잭션)
//!    → 임시 저장소에 토큰과 거래 스냅샷 저장 → 원문 토큰 반환
//! 2. `execute`: 지연 만료 스윕 → 해시 비교 → 임시 엔트리 원자 소비 → PIN 확인
//!    → pending→confirmed CAS → 스냅샷으로 브로커 호출 → confirmed→executed
//!
//! 프로세스 내 잠금은 없습니다. 행의 조건부 UPDATE와 저장소의 GETDEL만이
//! 경쟁하는 호출을 직렬화합니다.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::clock::{ms_to_datetime, Clock};
use crate::config::AuthConfig;
use crate::db::models::TradeAuthorizationRecord;
use crate::db::{AuditLogRepository, AuthorizationRepository, BrokerageConnectionRepository, PinRepository};
use crate::error::{TradeAuthError, TradeAuthResult};
use crate::external::{BrokerageClient, BrokerageFill, BrokerageOrderRequest, ExternalError, RiskProfile, RiskProvider};
use crate::security::{generate_token, hash_secret, hashes_match};
use crate::token_store::{secret_path, EphemeralTokenStore, TokenStoreError};
use crate::trade_auth::audit::AuditLog;
use crate::trade_auth::model::{
    AuditAction, AuditLogEntry, AuthorizationGrant, AuthorizationStatus, AuthorizeRequest,
    EphemeralSecretEntry, ExecutionResult, OrderType, TradeAuthorization, TradeDetails,
};
use crate::trade_auth::pin_guard::PinGuard;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const MAX_SYMBOL_LEN: usize = 12;
const RECONCILE_BATCH: i64 = 100;
const MISSING_ORDER_MESSAGE: &str = "브로커에 주문이 없습니다. 수동 확인이 필요합니다";

/// 대사 작업 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// 확인한 confirmed 건수
    pub checked: usize,
    /// 브로커 체결이 확인되어 executed로 확정된 건수
    pub finalized: usize,
    /// 여전히 수동 확인이 필요한 건수
    pub unresolved: usize,
}

/// 거래 승인 오케스트레이터
pub struct TradeAuthorizationOrchestrator {
    pool: SqlitePool,
    authorizations: AuthorizationRepository,
    connections: BrokerageConnectionRepository,
    audit: AuditLog,
    pin_guard: PinGuard,
    token_store: Arc<dyn EphemeralTokenStore>,
    risk: Arc<dyn RiskProvider>,
    brokerage: Arc<dyn BrokerageClient>,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl TradeAuthorizationOrchestrator {
    /// 새 오케스트레이터 생성
    pub fn new(
        pool: SqlitePool,
        token_store: Arc<dyn EphemeralTokenStore>,
        risk: Arc<dyn RiskProvider>,
        brokerage: Arc<dyn BrokerageClient>,
        config: AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let audit = AuditLog::new(AuditLogRepository::new(pool.clone()));
        let pin_guard = PinGuard::new(
            PinRepository::new(pool.clone()),
            audit.clone(),
            config.clone(),
            clock.clone(),
        );

        Self {
            authorizations: AuthorizationRepository::new(pool.clone()),
            connections: BrokerageConnectionRepository::new(pool.clone()),
            pool,
            audit,
            pin_guard,
            token_store,
            risk,
            brokerage,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// 거래 승인 발급
    pub async fn authorize(&self, request: AuthorizeRequest) -> TradeAuthResult<AuthorizationGrant> {
        let details = validate_request(&request)?;
        let user_id = request.user_id.trim();
        let connection_id = request.brokerage_connection_id.trim();

        // 활성 브로커 연결 확인
        let connection = self.connections.find_for_user(connection_id, user_id).await?;
        if !connection.map(|c| c.is_active()).unwrap_or(false) {
            warn!("비활성/미존재 브로커 연결로 승인 요청: {} / {}", user_id, connection_id);
            return Err(TradeAuthError::InvalidConnection);
        }

        let profile = self.check_risk(user_id, &details).await?;

        let now = self.clock.now_ms();
        let ttl = self.config.authorization_ttl;
        let ttl_seconds = self.config.ttl_seconds();
        let expires_at = now + ttl.as_millis() as i64;
        let id = Uuid::new_v4().to_string();
        let token = generate_token();

        let record = TradeAuthorizationRecord::new_pending(
            id.clone(),
            user_id.to_string(),
            connection_id.to_string(),
            &details,
            hash_secret(&token),
            now,
            expires_at,
        );

        // pending 행과 감사 로그, 임시 엔트리 저장을 하나의 단위로 처리
        let mut tx = self.pool.begin().await?;
        let daily_limit = i64::from(profile.daily_trade_limit);
        if !AuthorizationRepository::insert_pending(&mut tx, &record, now - DAY_MS, daily_limit).await? {
            warn!("일일 거래 한도 초과: {} (한도 {}건)", user_id, daily_limit);
            return Err(daily_limit_exceeded(profile.daily_trade_limit));
        }
        AuditLog::record_in(
            &mut tx,
            AuditAction::AuthCreated,
            user_id,
            Some(&id),
            json!({
                "symbol": details.symbol,
                "side": details.side,
                "quantity": details.quantity.to_string(),
                "order_type": details.order_type,
                "limit_price": details.limit_price.map(|p| p.to_string()),
                "brokerage_connection_id": connection_id,
                "expires_at": ms_to_datetime(expires_at),
                "ttl_seconds": ttl_seconds,
            }),
            now,
        )
        .await?;

        let entry = EphemeralSecretEntry {
            token: token.clone(),
            user_id: user_id.to_string(),
            trade_authorization_id: id.clone(),
            trade_details: details.clone(),
            created_at: now,
            expires_at,
            ttl_seconds,
        };
        let path = secret_path(user_id, &id);
        // 실패 시 tx가 drop 되며 롤백
        self.store_call(self.token_store.put(&path, &entry, ttl)).await?;

        if let Err(e) = tx.commit().await {
            self.delete_secret_best_effort(&path).await;
            return Err(e.into());
        }

        info!(
            "✅ 거래 승인 발급: {} ({} {} {} {}, TTL {}초)",
            id, user_id, details.side, details.quantity, details.symbol, ttl_seconds
        );

        Ok(AuthorizationGrant {
            trade_authorization_id: id,
            token,
            expires_at: ms_to_datetime(expires_at),
            ttl_seconds,
            trade_details: details,
        })
    }

    /// 승인 토큰으로 거래 실행
    pub async fn execute(
        &self,
        user_id: &str,
        trade_authorization_id: &str,
        token: &str,
        pin: Option<&str>,
    ) -> TradeAuthResult<ExecutionResult> {
        // 백그라운드 스윕 여부와 무관하게 만료를 먼저 반영
        self.sweep_expired().await?;

        let record = self
            .authorizations
            .find_for_user(trade_authorization_id, user_id)
            .await?
            .filter(|r| r.status == AuthorizationStatus::Pending.as_str())
            .ok_or(TradeAuthError::NotFoundOrAlreadyProcessed)?;

        // 해시 불일치 시 임시 저장소는 건드리지 않음
        if !hashes_match(&record.auth_token_hash, &hash_secret(token)) {
            warn!("⚠️ 승인 토큰 불일치: {} ({})", trade_authorization_id, user_id);
            self.audit
                .record(
                    AuditAction::AuthFailed,
                    user_id,
                    Some(trade_authorization_id),
                    json!({ "reason": "token_mismatch" }),
                    self.clock.now_ms(),
                )
                .await?;
            return Err(TradeAuthError::InvalidToken);
        }

        // 임시 엔트리 원자 소비 (두 번째 호출자는 None)
        let path = secret_path(user_id, trade_authorization_id);
        let taken = self.store_call(self.token_store.take(&path)).await?;
        let now = self.clock.now_ms();
        let entry = match taken {
            Some(entry)
                if hashes_match(&entry.token, token)
                    && entry.trade_authorization_id == trade_authorization_id
                    && entry.user_id == user_id
                    && entry.expires_at > now =>
            {
                entry
            }
            Some(_) => {
                self.expire_one(user_id, trade_authorization_id, "secret_expired").await?;
                return Err(TradeAuthError::TokenExpired);
            }
            None if record.expires_at <= now => {
                self.expire_one(user_id, trade_authorization_id, "secret_missing").await?;
                return Err(TradeAuthError::TokenExpired);
            }
            None => {
                // 다른 호출(실행/취소)이 이미 소비함. 행은 그쪽이 전이시킴
                debug!("임시 엔트리 이미 소비됨: {}", trade_authorization_id);
                let still_pending = self
                    .authorizations
                    .find_for_user(trade_authorization_id, user_id)
                    .await?
                    .map(|r| r.status == AuthorizationStatus::Pending.as_str())
                    .unwrap_or(false);
                return Err(if still_pending {
                    TradeAuthError::TokenExpired
                } else {
                    TradeAuthError::NotFoundOrAlreadyProcessed
                });
            }
        };

        // PIN 단계 인증 (실패해도 행은 pending 유지, 토큰은 이미 소비됨)
        if let Err(e) = self.pin_guard.verify(user_id, pin).await {
            let details = match &e {
                TradeAuthError::InvalidPin { attempts_remaining } => {
                    Some(json!({ "reason": "pin_invalid", "attempts_remaining": attempts_remaining }))
                }
                TradeAuthError::AccountLocked { locked_until } => {
                    Some(json!({ "reason": "account_locked", "locked_until": locked_until }))
                }
                _ => None,
            };
            let Some(details) = details else {
                return Err(e);
            };
            self.audit
                .record(AuditAction::AuthFailed, user_id, Some(trade_authorization_id), details, now)
                .await?;
            return Err(e);
        }

        // pending → confirmed (직렬화 지점)
        let mut tx = self.pool.begin().await?;
        if !AuthorizationRepository::mark_confirmed(&mut tx, trade_authorization_id, now).await? {
            return Err(TradeAuthError::NotFoundOrAlreadyProcessed);
        }
        AuditLog::record_in(
            &mut tx,
            AuditAction::AuthConfirmed,
            user_id,
            Some(trade_authorization_id),
            json!({ "pin_verified": pin.is_some() }),
            now,
        )
        .await?;
        tx.commit().await?;

        info!("거래 승인 확인: {} ({})", trade_authorization_id, user_id);

        // 요청 값이 아닌 승인 시점 스냅샷으로 주문
        let details = entry.trade_details;
        let order = BrokerageOrderRequest {
            client_order_id: trade_authorization_id.to_string(),
            symbol: details.symbol.clone(),
            side: details.side,
            quantity: details.quantity,
            order_type: details.order_type,
            limit_price: details.limit_price,
        };

        let fill = match self.brokerage_call(self.brokerage.place_order(&order)).await {
            Ok(fill) => fill,
            Err(e) => {
                self.record_brokerage_failure(user_id, trade_authorization_id, &e).await;
                return Err(TradeAuthError::Brokerage(e));
            }
        };

        let executed_at = self.clock.now_ms();
        self.finalize_execution(
            user_id,
            trade_authorization_id,
            &fill,
            executed_at,
            AuditAction::TradeExecuted,
        )
        .await?;

        info!(
            "🎯 거래 실행 완료: {} {} {} {} @ {} (브로커 주문 {})",
            trade_authorization_id, details.side, fill.filled_quantity, details.symbol, fill.fill_price, fill.broker_order_id
        );

        Ok(ExecutionResult {
            status: AuthorizationStatus::Executed,
            trade_authorization_id: trade_authorization_id.to_string(),
            symbol: details.symbol,
            side: details.side,
            quantity: fill.filled_quantity,
            price: fill.fill_price,
            broker_order_id: fill.broker_order_id,
            executed_at: ms_to_datetime(executed_at),
        })
    }

    /// pending 승인 취소
    pub async fn cancel(&self, user_id: &str, trade_authorization_id: &str) -> TradeAuthResult<()> {
        let now = self.clock.now_ms();

        let mut tx = self.pool.begin().await?;
        if !AuthorizationRepository::mark_cancelled(&mut tx, trade_authorization_id, user_id).await? {
            return Err(TradeAuthError::NotFoundOrAlreadyProcessed);
        }
        AuditLog::record_in(
            &mut tx,
            AuditAction::AuthCancelled,
            user_id,
            Some(trade_authorization_id),
            json!({ "reason": "user_request" }),
            now,
        )
        .await?;
        tx.commit().await?;

        // 삭제 실패는 치명적이지 않음 (TTL이 회수)
        self.delete_secret_best_effort(&secret_path(user_id, trade_authorization_id))
            .await;

        info!("거래 승인 취소: {} ({})", trade_authorization_id, user_id);
        Ok(())
    }

    /// 만료 시각이 지난 pending 승인을 expired로 전이
    pub async fn sweep_expired(&self) -> TradeAuthResult<usize> {
        let now = self.clock.now_ms();

        let mut tx = self.pool.begin().await?;
        let expired = AuthorizationRepository::expire_overdue(&mut tx, now).await?;
        for (id, user_id) in &expired {
            AuditLog::record_in(
                &mut tx,
                AuditAction::AuthExpired,
                user_id,
                Some(id),
                json!({ "reason": "ttl_elapsed" }),
                now,
            )
            .await?;
        }
        tx.commit().await?;

        if !expired.is_empty() {
            info!("⏰ 만료 처리된 승인: {}건", expired.len());
        }
        Ok(expired.len())
    }

    /// 브로커 호출 이후 confirmed에 머문 승인을 브로커 조회로 확정
    ///
    /// 브로커에 체결이 있으면 executed로 확정하고, 없으면 오류 메시지를 남긴 채
    /// confirmed로 둡니다. 자동 재주문은 하지 않습니다.
    pub async fn reconcile_confirmed(&self) -> TradeAuthResult<ReconcileReport> {
        let now = self.clock.now_ms();
        let cutoff = now - self.config.reconcile_after.as_millis() as i64;
        let recheck_cutoff = now - self.config.reconcile_recheck_interval.as_millis() as i64;
        let stale = self
            .authorizations
            .find_stale_confirmed(cutoff, recheck_cutoff, RECONCILE_BATCH)
            .await?;

        let mut report = ReconcileReport {
            checked: stale.len(),
            ..ReconcileReport::default()
        };

        for record in stale {
            match self.brokerage_call(self.brokerage.find_order(&record.id)).await {
                Ok(Some(fill)) => {
                    let now = self.clock.now_ms();
                    if self
                        .finalize_execution(&record.user_id, &record.id, &fill, now, AuditAction::TradeReconciled)
                        .await?
                    {
                        info!("🔁 대사 완료: {} → executed ({})", record.id, fill.broker_order_id);
                        report.finalized += 1;
                    }
                }
                Ok(None) => {
                    if record.reconcile_checked_at.is_none() {
                        error!("❌ 브로커에 주문이 없는 confirmed 승인 - 수동 확인 필요: {}", record.id);
                    } else {
                        debug!("여전히 브로커에 주문 없음: {}", record.id);
                    }
                    self.mark_unresolved(&record.id, Some(MISSING_ORDER_MESSAGE)).await?;
                    report.unresolved += 1;
                }
                Err(e) => {
                    warn!("대사 중 브로커 조회 실패: {} - {}", record.id, e);
                    self.mark_unresolved(&record.id, None).await?;
                    report.unresolved += 1;
                }
            }
        }

        if report.checked > 0 {
            info!(
                "대사 결과: 확인 {} / 확정 {} / 미해결 {}",
                report.checked, report.finalized, report.unresolved
            );
        }
        Ok(report)
    }

    /// 승인 상태 조회
    pub async fn get_authorization(
        &self,
        user_id: &str,
        trade_authorization_id: &str,
    ) -> TradeAuthResult<TradeAuthorization> {
        self.authorizations
            .find_for_user(trade_authorization_id, user_id)
            .await?
            .ok_or(TradeAuthError::NotFoundOrAlreadyProcessed)?
            .try_into()
    }

    /// 승인 감사 이력 조회 (소유자만)
    pub async fn audit_trail(
        &self,
        user_id: &str,
        trade_authorization_id: &str,
    ) -> TradeAuthResult<Vec<AuditLogEntry>> {
        if self
            .authorizations
            .find_for_user(trade_authorization_id, user_id)
            .await?
            .is_none()
        {
            return Err(TradeAuthError::NotFoundOrAlreadyProcessed);
        }
        self.audit.entries_for(trade_authorization_id).await
    }

    /// 거래 PIN 설정/변경
    pub async fn set_or_change_pin(
        &self,
        user_id: &str,
        new_pin: &str,
        current_pin: Option<&str>,
    ) -> TradeAuthResult<()> {
        if user_id.trim().is_empty() {
            return Err(TradeAuthError::Validation("user_id가 비어 있습니다".into()));
        }
        self.pin_guard.set_or_change_pin(user_id, new_pin, current_pin).await
    }

    /// 포지션 비중 검사 후 프로필 반환 (일일 한도는 INSERT 시점에 검사)
    async fn check_risk(&self, user_id: &str, details: &TradeDetails) -> TradeAuthResult<RiskProfile> {
        let profile = self
            .external_call(self.config.external_call_timeout, self.risk.risk_profile(user_id))
            .await?;

        if let (Some(portfolio_value), Some(price)) = (profile.portfolio_value, details.limit_price) {
            let notional = details.quantity * price;
            let cap = portfolio_value * profile.max_position_pct / Decimal::from(100);
            if notional > cap {
                warn!("포지션 비중 한도 초과: {} (주문 {} > 한도 {})", user_id, notional, cap);
                return Err(TradeAuthError::RiskLimitExceeded(format!(
                    "주문 금액이 포트폴리오의 {}%를 초과합니다",
                    profile.max_position_pct
                )));
            }
        }

        Ok(profile)
    }

    /// 대사 조회 시각을 남겨 다음 배치가 뒤의 건으로 넘어가게 함
    async fn mark_unresolved(&self, trade_authorization_id: &str, message: Option<&str>) -> TradeAuthResult<()> {
        let now = self.clock.now_ms();
        let mut conn = self.pool.acquire().await?;
        AuthorizationRepository::mark_reconcile_checked(&mut conn, trade_authorization_id, now, message).await?;
        Ok(())
    }

    /// confirmed → executed 전이와 감사 로그를 함께 커밋
    async fn finalize_execution(
        &self,
        user_id: &str,
        trade_authorization_id: &str,
        fill: &BrokerageFill,
        executed_at: i64,
        action: AuditAction,
    ) -> TradeAuthResult<bool> {
        let mut tx = self.pool.begin().await?;
        let updated = AuthorizationRepository::mark_executed(
            &mut tx,
            trade_authorization_id,
            executed_at,
            &fill.fill_price.to_string(),
            &fill.filled_quantity.to_string(),
            &fill.broker_order_id,
        )
        .await?;

        if !updated {
            // 대사 작업이 먼저 확정한 경우
            warn!("이미 확정된 승인에 대한 체결 기록 무시: {}", trade_authorization_id);
            return Ok(false);
        }

        AuditLog::record_in(
            &mut tx,
            action,
            user_id,
            Some(trade_authorization_id),
            json!({
                "broker_order_id": fill.broker_order_id,
                "price": fill.fill_price.to_string(),
                "quantity": fill.filled_quantity.to_string(),
            }),
            executed_at,
        )
        .await?;
        tx.commit().await?;
        Ok(true)
    }

    /// 브로커 실패: confirmed 유지 + 오류 메시지 + 감사 로그
    async fn record_brokerage_failure(&self, user_id: &str, trade_authorization_id: &str, cause: &ExternalError) {
        error!("❌ 브로커 주문 실패 - 대사 필요: {} ({})", trade_authorization_id, cause);

        if let Err(e) = self.persist_brokerage_failure(user_id, trade_authorization_id, cause).await {
            error!("브로커 실패 기록 저장 실패: {} - {}", trade_authorization_id, e);
        }
    }

    async fn persist_brokerage_failure(
        &self,
        user_id: &str,
        trade_authorization_id: &str,
        cause: &ExternalError,
    ) -> TradeAuthResult<()> {
        let now = self.clock.now_ms();
        let mut tx = self.pool.begin().await?;
        AuthorizationRepository::record_error(&mut tx, trade_authorization_id, &cause.to_string()).await?;
        AuditLog::record_in(
            &mut tx,
            AuditAction::TradeFailed,
            user_id,
            Some(trade_authorization_id),
            json!({ "error": cause.to_string() }),
            now,
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// pending → expired, 실제로 전이했으면 `true`
    async fn expire_one(&self, user_id: &str, trade_authorization_id: &str, reason: &str) -> TradeAuthResult<bool> {
        let now = self.clock.now_ms();
        let mut tx = self.pool.begin().await?;
        let expired = AuthorizationRepository::mark_expired(&mut tx, trade_authorization_id).await?;
        if expired {
            AuditLog::record_in(
                &mut tx,
                AuditAction::AuthExpired,
                user_id,
                Some(trade_authorization_id),
                json!({ "reason": reason }),
                now,
            )
            .await?;
        }
        tx.commit().await?;
        if expired {
            info!("⏰ 승인 만료: {} ({})", trade_authorization_id, reason);
        }
        Ok(expired)
    }

    async fn delete_secret_best_effort(&self, path: &str) {
        if let Err(e) = self.store_call(self.token_store.delete(path)).await {
            warn!("임시 엔트리 삭제 실패 (TTL로 회수됨): {} - {}", path, e);
        }
    }

    async fn store_call<T>(
        &self,
        fut: impl Future<Output = Result<T, TokenStoreError>>,
    ) -> Result<T, TokenStoreError> {
        bounded(self.config.external_call_timeout, fut, || TokenStoreError::Timeout).await
    }

    async fn brokerage_call<T>(
        &self,
        fut: impl Future<Output = Result<T, ExternalError>>,
    ) -> Result<T, ExternalError> {
        self.external_call(self.config.brokerage_timeout, fut).await
    }

    async fn external_call<T>(
        &self,
        limit: Duration,
        fut: impl Future<Output = Result<T, ExternalError>>,
    ) -> Result<T, ExternalError> {
        bounded(limit, fut, || ExternalError::Timeout(limit.as_millis() as u64)).await
    }
}

async fn bounded<T, E>(
    limit: Duration,
    fut: impl Future<Output = Result<T, E>>,
    on_timeout: impl FnOnce() -> E,
) -> Result<T, E> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}

fn daily_limit_exceeded(limit: u32) -> TradeAuthError {
    TradeAuthError::RiskLimitExceeded(format!("일일 거래 한도 {}건에 도달했습니다", limit))
}

/// 입력 검증 및 정규화
fn validate_request(request: &AuthorizeRequest) -> TradeAuthResult<TradeDetails> {
    if request.user_id.trim().is_empty() {
        return Err(TradeAuthError::Validation("user_id가 비어 있습니다".into()));
    }
    if request.brokerage_connection_id.trim().is_empty() {
        return Err(TradeAuthError::Validation("brokerage_connection_id가 비어 있습니다".into()));
    }

    let symbol = request.symbol.trim().to_uppercase();
    if symbol.is_empty()
        || symbol.len() > MAX_SYMBOL_LEN
        || !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(TradeAuthError::Validation(format!("잘못된 심볼: {}", request.symbol)));
    }

    if request.quantity <= Decimal::ZERO {
        return Err(TradeAuthError::Validation("수량은 0보다 커야 합니다".into()));
    }

    match request.limit_price {
        Some(price) if price <= Decimal::ZERO => {
            return Err(TradeAuthError::Validation("가격은 0보다 커야 합니다".into()));
        }
        Some(_) if request.order_type == OrderType::Market => {
            return Err(TradeAuthError::Validation("시장가 주문에는 가격을 지정할 수 없습니다".into()));
        }
        None if request.order_type.requires_limit_price() => {
            return Err(TradeAuthError::Validation(format!(
                "{} 주문에는 가격이 필요합니다",
                request.order_type
            )));
        }
        _ => {}
    }

    Ok(TradeDetails {
        symbol,
        side: request.side,
        quantity: request.quantity.normalize(),
        order_type: request.order_type,
        limit_price: request.limit_price.map(|p| p.normalize()),
    })
}
