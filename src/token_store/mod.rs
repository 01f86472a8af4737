//! 임시 비밀 저장소 어댑터
//!
//! 승인 토큰과 거래 스냅샷을 TTL과 함께 보관하는 외부 저장소를 감쌉니다.
//! `take`는 읽기와 삭제를 하나의 원자 연산으로 수행해야 하며, 같은 경로를
//! 두 번째로 읽는 호출자는 반드시 `None`을 받아야 합니다.

pub mod memory_store;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::trade_auth::model::EphemeralSecretEntry;

pub use memory_store::MemoryTokenStore;
pub use redis_store::RedisTokenStore;

/// 저장소 키 네임스페이스
pub const SECRET_PATH_PREFIX: &str = "trade_auth";

/// 토큰 저장소 오류
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("Redis 오류: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("직렬화 오류: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("저장소 응답 시간 초과")]
    Timeout,
}

/// `(user_id, trade_authorization_id)` 별 저장 경로
pub fn secret_path(user_id: &str, trade_authorization_id: &str) -> String {
    format!("{}:{}:{}", SECRET_PATH_PREFIX, user_id, trade_authorization_id)
}

/// 임시 비밀 저장소
#[async_trait]
pub trait EphemeralTokenStore: Send + Sync {
    /// TTL과 함께 엔트리 저장
    async fn put(&self, path: &str, entry: &EphemeralSecretEntry, ttl: Duration) -> Result<(), TokenStoreError>;

    /// 엔트리를 읽고 즉시 삭제 (한 번만 성공)
    async fn take(&self, path: &str) -> Result<Option<EphemeralSecretEntry>, TokenStoreError>;

    /// 엔트리 삭제 (없어도 성공)
    async fn delete(&self, path: &str) -> Result<(), TokenStoreError>;
}
