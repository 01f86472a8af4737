//! 거래 PIN 단계 인증
//!
//! PIN은 선택 사항입니다. 설정된 사용자는 실행 시점에 PIN을 검증받고,
//! 연속 실패가 임계값에 도달하면 일정 시간 잠깁니다. 실패 카운터 증가와
//! 잠금 설정은 DB의 단일 UPDATE로 처리되어 여러 인스턴스에서도 안전합니다.

use std::sync::Arc;

use log::{info, warn};
use serde_json::json;

use crate::clock::{ms_to_datetime, Clock};
use crate::config::AuthConfig;
use crate::db::PinRepository;
use crate::error::{TradeAuthError, TradeAuthResult};
use crate::security::{hash_secret, hashes_match};
use crate::trade_auth::audit::AuditLog;
use crate::trade_auth::model::AuditAction;

/// PIN 검증기
#[derive(Clone)]
pub struct PinGuard {
    repository: PinRepository,
    audit: AuditLog,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl PinGuard {
    pub fn new(repository: PinRepository, audit: AuditLog, config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            audit,
            config,
            clock,
        }
    }

    /// 거래 시점 PIN 검증
    ///
    /// PIN 레코드가 없으면 성공. 잠금 중이면 해시를 계산하지 않고 바로 거부합니다.
    pub async fn verify(&self, user_id: &str, pin: Option<&str>) -> TradeAuthResult<()> {
        let Some(record) = self.repository.find(user_id).await? else {
            return Ok(());
        };

        let now = self.clock.now_ms();
        if let Some(locked_until) = record.locked_until {
            if locked_until > now {
                warn!("🔒 잠긴 계정의 PIN 시도: {}", user_id);
                return Err(TradeAuthError::AccountLocked {
                    locked_until: ms_to_datetime(locked_until),
                });
            }
        }

        let threshold = i64::from(self.config.lockout_threshold);

        // PIN 미입력은 추측 시도가 아니므로 카운터를 올리지 않음
        let Some(pin) = pin else {
            let used = if record.locked_until.is_some() { 0 } else { record.failed_attempts };
            return Err(TradeAuthError::InvalidPin {
                attempts_remaining: remaining(threshold, used),
            });
        };

        if hashes_match(&record.pin_hash, &hash_secret(pin)) {
            self.repository.reset_failures(user_id, now).await?;
            return Ok(());
        }

        let lock_until = now + self.config.lockout_duration.as_millis() as i64;
        let (failed_attempts, locked_until) = self
            .repository
            .record_failure(user_id, threshold, lock_until, now)
            .await?
            // 조회와 갱신 사이에 레코드가 사라진 경우
            .unwrap_or((threshold, Some(lock_until)));

        let attempts_remaining = remaining(threshold, failed_attempts);
        warn!("PIN 불일치: {} (실패 {}회, 남은 시도 {})", user_id, failed_attempts, attempts_remaining);

        if failed_attempts >= threshold {
            if let Some(locked_until) = locked_until {
                warn!("🔒 PIN 잠금 설정: {} (해제 {})", user_id, ms_to_datetime(locked_until));
                self.audit
                    .record_best_effort(
                        AuditAction::PinLocked,
                        user_id,
                        None,
                        json!({
                            "failed_attempts": failed_attempts,
                            "locked_until": ms_to_datetime(locked_until),
                        }),
                        now,
                    )
                    .await;
            }
        }

        Err(TradeAuthError::InvalidPin { attempts_remaining })
    }

    /// PIN 설정 또는 변경
    ///
    /// 기존 PIN이 있으면 `current_pin`이 일치해야 합니다. 이 경로는 잠금 카운터를 건드리지 않습니다.
    pub async fn set_or_change_pin(
        &self,
        user_id: &str,
        new_pin: &str,
        current_pin: Option<&str>,
    ) -> TradeAuthResult<()> {
        self.validate_pin_format(new_pin)?;

        let existing = self.repository.find(user_id).await?;
        if let Some(record) = &existing {
            let current_ok = current_pin
                .map(|current| hashes_match(&record.pin_hash, &hash_secret(current)))
                .unwrap_or(false);
            if !current_ok {
                warn!("PIN 변경 거부 (현재 PIN 불일치): {}", user_id);
                return Err(TradeAuthError::InvalidPin {
                    attempts_remaining: remaining(
                        i64::from(self.config.lockout_threshold),
                        record.failed_attempts,
                    ),
                });
            }
        }

        let now = self.clock.now_ms();
        self.repository
            .upsert(user_id, &hash_secret(new_pin), now)
            .await?;

        let changed = existing.is_some();
        self.audit
            .record(
                AuditAction::PinChanged,
                user_id,
                None,
                json!({ "changed": changed }),
                now,
            )
            .await?;

        info!("거래 PIN {}: {}", if changed { "변경" } else { "설정" }, user_id);
        Ok(())
    }

    fn validate_pin_format(&self, pin: &str) -> TradeAuthResult<()> {
        let len = pin.len();
        if len < self.config.pin_min_length
            || len > self.config.pin_max_length
            || !pin.chars().all(|c| c.is_ascii_digit())
        {
            return Err(TradeAuthError::Validation(format!(
                "PIN은 {}~{}자리 숫자여야 합니다",
                self.config.pin_min_length, self.config.pin_max_length
            )));
        }
        Ok(())
    }
}

fn remaining(threshold: i64, used: i64) -> u32 {
    (threshold - used).max(0) as u32
}
