use super::models::{
    AuditLogRecord, BrokerageConnectionRecord, TradeAuthorizationRecord, UserTradePinRecord,
};
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::Error as SqlxError;

const AUTHORIZATION_COLUMNS: &str = "id, user_id, brokerage_connection_id, symbol, side, quantity, order_type, \
     limit_price, auth_token_hash, status, created_at, expires_at, confirmed_at, executed_at, \
     executed_price, executed_quantity, broker_order_id, error_message, reconcile_checked_at";

/// 거래 승인 저장소
///
/// 상태 전이는 모두 `WHERE status = ?` 조건부 UPDATE로 수행하며,
/// 반환값 `false`는 다른 호출자가 먼저 전이시켰다는 뜻입니다.
#[derive(Clone)]
pub struct AuthorizationRepository {
    pool: SqlitePool,
}

impl AuthorizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// pending 승인 저장 (트랜잭션 안에서 호출)
    ///
    /// 일일 한도 검사와 INSERT를 한 문장으로 수행합니다. `since` 이후 생성된
    /// 취소 외 승인이 `daily_limit`건 이상이면 저장하지 않고 `false`를 반환합니다.
    pub async fn insert_pending(
        conn: &mut SqliteConnection,
        record: &TradeAuthorizationRecord,
        since: i64,
        daily_limit: i64,
    ) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            "INSERT INTO trade_authorizations
             (id, user_id, brokerage_connection_id, symbol, side, quantity, order_type, limit_price,
              auth_token_hash, status, created_at, expires_at)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10, ?11
             WHERE (SELECT COUNT(*) FROM trade_authorizations
                    WHERE user_id = ?2 AND created_at >= ?12 AND status != 'cancelled') < ?13"
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.brokerage_connection_id)
        .bind(&record.symbol)
        .bind(&record.side)
        .bind(&record.quantity)
        .bind(&record.order_type)
        .bind(&record.limit_price)
        .bind(&record.auth_token_hash)
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(since)
        .bind(daily_limit)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 사용자 소유 승인 조회
    pub async fn find_for_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<TradeAuthorizationRecord>, SqlxError> {
        let record = sqlx::query_as::<_, TradeAuthorizationRecord>(&format!(
            "SELECT {} FROM trade_authorizations WHERE id = ? AND user_id = ?",
            AUTHORIZATION_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// pending → confirmed
    pub async fn mark_confirmed(
        conn: &mut SqliteConnection,
        id: &str,
        confirmed_at: i64,
    ) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            "UPDATE trade_authorizations
             SET status = 'confirmed', confirmed_at = ?
             WHERE id = ? AND status = 'pending'"
        )
        .bind(confirmed_at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// pending → cancelled (소유자만)
    pub async fn mark_cancelled(
        conn: &mut SqliteConnection,
        id: &str,
        user_id: &str,
    ) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            "UPDATE trade_authorizations
             SET status = 'cancelled'
             WHERE id = ? AND user_id = ? AND status = 'pending'"
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// pending → expired (단건)
    pub async fn mark_expired(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            "UPDATE trade_authorizations
             SET status = 'expired'
             WHERE id = ? AND status = 'pending'"
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 만료 시각이 지난 pending 승인 일괄 만료, 전이된 (id, user_id) 반환
    pub async fn expire_overdue(
        conn: &mut SqliteConnection,
        now: i64,
    ) -> Result<Vec<(String, String)>, SqlxError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "UPDATE trade_authorizations
             SET status = 'expired'
             WHERE status = 'pending' AND expires_at <= ?
             RETURNING id, user_id"
        )
        .bind(now)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// confirmed → executed, 체결 정보 기록
    pub async fn mark_executed(
        conn: &mut SqliteConnection,
        id: &str,
        executed_at: i64,
        executed_price: &str,
        executed_quantity: &str,
        broker_order_id: &str,
    ) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            "UPDATE trade_authorizations
             SET status = 'executed', executed_at = ?, executed_price = ?, executed_quantity = ?,
                 broker_order_id = ?, error_message = NULL
             WHERE id = ? AND status = 'confirmed'"
        )
        .bind(executed_at)
        .bind(executed_price)
        .bind(executed_quantity)
        .bind(broker_order_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// confirmed 상태 유지한 채 오류 메시지 기록
    pub async fn record_error(
        conn: &mut SqliteConnection,
        id: &str,
        message: &str,
    ) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            "UPDATE trade_authorizations
             SET error_message = ?
             WHERE id = ? AND status = 'confirmed'"
        )
        .bind(message)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 대사 대상 confirmed 승인
    ///
    /// `confirmed_before` 이전에 confirmed 되었고, 아직 조회한 적이 없거나
    /// 마지막 조회가 `checked_before` 이전인 건을 오래 조회하지 않은 순으로 반환합니다.
    pub async fn find_stale_confirmed(
        &self,
        confirmed_before: i64,
        checked_before: i64,
        limit: i64,
    ) -> Result<Vec<TradeAuthorizationRecord>, SqlxError> {
        let records = sqlx::query_as::<_, TradeAuthorizationRecord>(&format!(
            "SELECT {} FROM trade_authorizations
             WHERE status = 'confirmed' AND confirmed_at <= ?
               AND (reconcile_checked_at IS NULL OR reconcile_checked_at <= ?)
             ORDER BY COALESCE(reconcile_checked_at, 0) ASC, confirmed_at ASC
             LIMIT ?",
            AUTHORIZATION_COLUMNS
        ))
        .bind(confirmed_before)
        .bind(checked_before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// 해결되지 않은 대사 조회 시각 기록 (오류 메시지는 주어진 경우만 갱신)
    pub async fn mark_reconcile_checked(
        conn: &mut SqliteConnection,
        id: &str,
        checked_at: i64,
        message: Option<&str>,
    ) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            "UPDATE trade_authorizations
             SET reconcile_checked_at = ?, error_message = COALESCE(?, error_message)
             WHERE id = ? AND status = 'confirmed'"
        )
        .bind(checked_at)
        .bind(message)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// 거래 PIN 저장소
#[derive(Clone)]
pub struct PinRepository {
    pool: SqlitePool,
}

impl PinRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// PIN 조회
    pub async fn find(&self, user_id: &str) -> Result<Option<UserTradePinRecord>, SqlxError> {
        let record = sqlx::query_as::<_, UserTradePinRecord>(
            "SELECT user_id, pin_hash, failed_attempts, locked_until, updated_at
             FROM user_trade_pins
             WHERE user_id = ?"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// 실패 횟수 증가 + 임계값 도달 시 잠금을 한 번의 UPDATE로 수행
    ///
    /// 이미 지난 잠금은 해제된 것으로 보고 1회부터 다시 셉니다.
    /// 갱신 후 (failed_attempts, locked_until) 반환
    pub async fn record_failure(
        &self,
        user_id: &str,
        threshold: i64,
        lock_until: i64,
        now: i64,
    ) -> Result<Option<(i64, Option<i64>)>, SqlxError> {
        let row = sqlx::query_as::<_, (i64, Option<i64>)>(
            "UPDATE user_trade_pins
             SET failed_attempts = CASE
                     WHEN locked_until IS NOT NULL AND locked_until <= ?1 THEN 1
                     ELSE failed_attempts + 1
                 END,
                 locked_until = CASE
                     WHEN (CASE WHEN locked_until IS NOT NULL AND locked_until <= ?1 THEN 1
                                ELSE failed_attempts + 1 END) >= ?2 THEN ?3
                     WHEN locked_until IS NOT NULL AND locked_until <= ?1 THEN NULL
                     ELSE locked_until
                 END,
                 updated_at = ?1
             WHERE user_id = ?4
             RETURNING failed_attempts, locked_until"
        )
        .bind(now)
        .bind(threshold)
        .bind(lock_until)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// 검증 성공 시 카운터 초기화
    pub async fn reset_failures(&self, user_id: &str, now: i64) -> Result<(), SqlxError> {
        sqlx::query(
            "UPDATE user_trade_pins
             SET failed_attempts = 0, locked_until = NULL, updated_at = ?
             WHERE user_id = ?"
        )
        .bind(now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// PIN 설정/변경 (카운터 초기화 포함)
    pub async fn upsert(&self, user_id: &str, pin_hash: &str, now: i64) -> Result<(), SqlxError> {
        sqlx::query(
            "INSERT INTO user_trade_pins (user_id, pin_hash, failed_attempts, locked_until, updated_at)
             VALUES (?, ?, 0, NULL, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                pin_hash = excluded.pin_hash,
                failed_attempts = 0,
                locked_until = NULL,
                updated_at = excluded.updated_at"
        )
        .bind(user_id)
        .bind(pin_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// 감사 로그 저장소 (INSERT / SELECT 만 존재)
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: SqlitePool,
}

impl AuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 로그 기록 (주어진 연결/트랜잭션에서)
    pub async fn append_with(
        conn: &mut SqliteConnection,
        trade_authorization_id: Option<&str>,
        user_id: &str,
        action: &str,
        details: &str,
        created_at: i64,
    ) -> Result<i64, SqlxError> {
        let result = sqlx::query(
            "INSERT INTO trade_audit_log (trade_authorization_id, user_id, action, details, created_at)
             VALUES (?, ?, ?, ?, ?)"
        )
        .bind(trade_authorization_id)
        .bind(user_id)
        .bind(action)
        .bind(details)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// 로그 기록
    pub async fn append(
        &self,
        trade_authorization_id: Option<&str>,
        user_id: &str,
        action: &str,
        details: &str,
        created_at: i64,
    ) -> Result<i64, SqlxError> {
        let mut conn = self.pool.acquire().await?;
        Self::append_with(&mut conn, trade_authorization_id, user_id, action, details, created_at).await
    }

    /// 승인별 로그 조회 (기록 순)
    pub async fn find_by_authorization(
        &self,
        trade_authorization_id: &str,
    ) -> Result<Vec<AuditLogRecord>, SqlxError> {
        let logs = sqlx::query_as::<_, AuditLogRecord>(
            "SELECT id, trade_authorization_id, user_id, action, details, created_at
             FROM trade_audit_log
             WHERE trade_authorization_id = ?
             ORDER BY id ASC"
        )
        .bind(trade_authorization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}

/// 브로커 연결 저장소
#[derive(Clone)]
pub struct BrokerageConnectionRepository {
    pool: SqlitePool,
}

impl BrokerageConnectionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 연결 등록 (없으면 생성, 있으면 상태 갱신)
    pub async fn upsert(&self, connection: &BrokerageConnectionRecord) -> Result<(), SqlxError> {
        sqlx::query(
            "INSERT INTO brokerage_connections (id, user_id, broker_name, status, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                broker_name = excluded.broker_name,
                status = excluded.status"
        )
        .bind(&connection.id)
        .bind(&connection.user_id)
        .bind(&connection.broker_name)
        .bind(&connection.status)
        .bind(connection.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 사용자 소유 연결 조회
    pub async fn find_for_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<BrokerageConnectionRecord>, SqlxError> {
        let record = sqlx::query_as::<_, BrokerageConnectionRecord>(
            "SELECT id, user_id, broker_name, status, created_at
             FROM brokerage_connections
             WHERE id = ? AND user_id = ?"
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
