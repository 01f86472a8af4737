//! Redis 기반 임시 비밀 저장소
//!
//! `SET ... PX`로 서버 측 TTL을 걸고, `GETDEL`로 원자적으로 소비합니다 (Redis 6.2+).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use redis::aio::Connection;
use redis::{Client, Cmd, FromRedisValue, RedisResult};
use tokio::sync::Mutex;

use super::{EphemeralTokenStore, TokenStoreError};
use crate::trade_auth::model::EphemeralSecretEntry;

/// Redis 토큰 저장소
pub struct RedisTokenStore {
    client: Arc<Client>,
    connection: Arc<Mutex<Connection>>,
}

impl RedisTokenStore {
    /// 새 저장소 연결
    pub async fn new(redis_url: &str) -> RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let connection = client.get_async_connection().await?;

        info!("Redis 토큰 저장소 연결 완료");

        Ok(Self {
            client: Arc::new(client),
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// 명령 실행, 연결이 끊겼으면 한 번 재연결 후 재시도
    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> RedisResult<T> {
        let mut conn = self.connection.lock().await;
        match cmd.query_async(&mut *conn).await {
            Err(e) if e.is_connection_dropped() || e.is_io_error() => {
                warn!("Redis 연결 끊김, 재연결 시도: {}", e);
                *conn = self.client.get_async_connection().await?;
                info!("Redis 토큰 저장소 재연결 완료");
                cmd.query_async(&mut *conn).await
            }
            result => result,
        }
    }
}

/// `SET path payload PX ttl` (TTL은 최소 1ms)
fn set_command(path: &str, payload: &str, ttl: Duration) -> Cmd {
    let ttl_ms = ttl.as_millis().max(1) as u64;
    let mut cmd = redis::cmd("SET");
    cmd.arg(path).arg(payload).arg("PX").arg(ttl_ms);
    cmd
}

/// 원자적 get + delete
fn getdel_command(path: &str) -> Cmd {
    let mut cmd = redis::cmd("GETDEL");
    cmd.arg(path);
    cmd
}

fn decode_entry(payload: Option<String>) -> Result<Option<EphemeralSecretEntry>, TokenStoreError> {
    match payload {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

#[async_trait]
impl EphemeralTokenStore for RedisTokenStore {
    async fn put(&self, path: &str, entry: &EphemeralSecretEntry, ttl: Duration) -> Result<(), TokenStoreError> {
        let payload = serde_json::to_string(entry)?;
        self.query::<()>(&set_command(path, &payload, ttl)).await?;

        debug!("임시 엔트리 저장: {} (TTL {:?})", path, ttl);
        Ok(())
    }

    async fn take(&self, path: &str) -> Result<Option<EphemeralSecretEntry>, TokenStoreError> {
        let payload: Option<String> = self.query(&getdel_command(path)).await?;
        decode_entry(payload)
    }

    async fn delete(&self, path: &str) -> Result<(), TokenStoreError> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(path);
        self.query::<()>(&cmd).await?;
        Ok(())
    }
}
