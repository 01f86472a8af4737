//! 시간 소스 추상화
//!
//! 만료/잠금 판정이 모두 같은 시계를 보도록 오케스트레이터, PIN 검증기,
//! 메모리 토큰 저장소에 주입합니다. 테스트에서는 `ManualClock`으로 시간을 이동합니다.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

/// 현재 시각 제공자 (Unix epoch 밀리초)
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;

    fn now(&self) -> DateTime<Utc> {
        ms_to_datetime(self.now_ms())
    }
}

/// 실제 시스템 시간
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// 수동으로 진행시키는 시계 (테스트 및 시뮬레이션용)
#[derive(Debug)]
pub struct ManualClock {
    time_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            time_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.time_ms.fetch_add(delta_ms, Ordering::AcqRel);
    }

    pub fn advance_secs(&self, delta_secs: i64) {
        self.advance_ms(delta_secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.time_ms.load(Ordering::Acquire)
    }
}

/// 밀리초 타임스탬프를 UTC 시각으로 변환
pub fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
