//! 추가 전용 감사 로그
//!
//! 승인 상태 전이마다 정확히 한 건을 남깁니다. 상세 정보에는 토큰이나 PIN 원문을
//! 넣지 않습니다. 이 모듈에는 수정/삭제 경로가 없습니다.

use log::warn;
use serde_json::Value;
use sqlx::sqlite::SqliteConnection;

use crate::db::AuditLogRepository;
use crate::error::TradeAuthResult;
use crate::trade_auth::model::{AuditAction, AuditLogEntry};

/// 감사 로그 기록기
#[derive(Clone)]
pub struct AuditLog {
    repository: AuditLogRepository,
}

impl AuditLog {
    pub fn new(repository: AuditLogRepository) -> Self {
        Self { repository }
    }

    /// 감사 항목 추가
    pub async fn record(
        &self,
        action: AuditAction,
        user_id: &str,
        trade_authorization_id: Option<&str>,
        details: Value,
        now_ms: i64,
    ) -> TradeAuthResult<i64> {
        let id = self
            .repository
            .append(
                trade_authorization_id,
                user_id,
                action.as_str(),
                &details.to_string(),
                now_ms,
            )
            .await?;
        Ok(id)
    }

    /// 트랜잭션 안에서 감사 항목 추가 (상태 변경과 함께 커밋/롤백)
    pub async fn record_in(
        conn: &mut SqliteConnection,
        action: AuditAction,
        user_id: &str,
        trade_authorization_id: Option<&str>,
        details: Value,
        now_ms: i64,
    ) -> TradeAuthResult<i64> {
        let id = AuditLogRepository::append_with(
            conn,
            trade_authorization_id,
            user_id,
            action.as_str(),
            &details.to_string(),
            now_ms,
        )
        .await?;
        Ok(id)
    }

    /// 보조 기록 (실패해도 요청 결과를 바꾸지 않음)
    pub async fn record_best_effort(
        &self,
        action: AuditAction,
        user_id: &str,
        trade_authorization_id: Option<&str>,
        details: Value,
        now_ms: i64,
    ) {
        if let Err(e) = self
            .record(action, user_id, trade_authorization_id, details, now_ms)
            .await
        {
            warn!("감사 로그 기록 실패 - {} ({}): {}", action, user_id, e);
        }
    }

    /// 승인별 감사 이력
    pub async fn entries_for(&self, trade_authorization_id: &str) -> TradeAuthResult<Vec<AuditLogEntry>> {
        self.repository
            .find_by_authorization(trade_authorization_id)
            .await?
            .into_iter()
            .map(AuditLogEntry::try_from)
            .collect()
    }
}
