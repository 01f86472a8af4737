//! 프로세스 내 TTL 저장소
//!
//! Redis 없이 실행하는 로컬 개발과 테스트용입니다. 만료 판정은 주입된 시계를 따릅니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;

use super::{EphemeralTokenStore, TokenStoreError};
use crate::clock::Clock;
use crate::trade_auth::model::EphemeralSecretEntry;

/// 메모리 토큰 저장소
pub struct MemoryTokenStore {
    data: Mutex<HashMap<String, (EphemeralSecretEntry, i64)>>, // path -> (entry, expiry ms)
    clock: Arc<dyn Clock>,
}

impl MemoryTokenStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// 만료되지 않은 엔트리 수
    pub async fn len(&self) -> usize {
        let now = self.clock.now_ms();
        let mut data = self.data.lock().await;
        data.retain(|_, (_, expiry)| now < *expiry);
        data.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 경로에 엔트리가 살아 있는지 확인 (소비하지 않음)
    pub async fn contains(&self, path: &str) -> bool {
        let now = self.clock.now_ms();
        let data = self.data.lock().await;
        matches!(data.get(path), Some((_, expiry)) if now < *expiry)
    }
}

#[async_trait]
impl EphemeralTokenStore for MemoryTokenStore {
    async fn put(&self, path: &str, entry: &EphemeralSecretEntry, ttl: Duration) -> Result<(), TokenStoreError> {
        let expiry = self.clock.now_ms() + ttl.as_millis() as i64;
        self.data
            .lock()
            .await
            .insert(path.to_string(), (entry.clone(), expiry));
        Ok(())
    }

    async fn take(&self, path: &str) -> Result<Option<EphemeralSecretEntry>, TokenStoreError> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock().await;
        match data.remove(path) {
            Some((entry, expiry)) if now < expiry => Ok(Some(entry)),
            Some(_) => {
                // 만료된 데이터 제거
                debug!("만료된 임시 엔트리 제거: {}", path);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), TokenStoreError> {
        self.data.lock().await.remove(path);
        Ok(())
    }
}
