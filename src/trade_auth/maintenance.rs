//! 백그라운드 정리 작업
//!
//! 일정 간격으로 만료된 pending 승인을 정리하고, 브로커 호출 이후 confirmed에
//! 머문 승인을 대사합니다. 정확성은 `execute`의 지연 스윕이 보장하므로 이 루프는
//! 보조 수단입니다.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, info};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::trade_auth::orchestrator::TradeAuthorizationOrchestrator;

/// 정리 작업 통계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceStats {
    pub runs: u64,
    pub expired: u64,
    pub reconciled: u64,
    pub failures: u64,
}

/// 만료 스윕 + 대사 워커
pub struct MaintenanceWorker {
    orchestrator: Arc<TradeAuthorizationOrchestrator>,
    interval: Duration,
    runs: AtomicU64,
    expired: AtomicU64,
    reconciled: AtomicU64,
    failures: AtomicU64,
}

impl MaintenanceWorker {
    pub fn new(orchestrator: Arc<TradeAuthorizationOrchestrator>) -> Self {
        let interval = orchestrator.config().sweep_interval;
        Self {
            orchestrator,
            interval,
            runs: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            reconciled: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// 정리 루프 실행 (백그라운드 태스크)
    pub async fn run(self: Arc<Self>) {
        info!("🚀 승인 정리 루프 시작 (간격: {:?})", self.interval);

        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            self.run_once().await;
        }
    }

    /// 스윕과 대사를 한 번 수행
    pub async fn run_once(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);

        match self.orchestrator.sweep_expired().await {
            Ok(count) => {
                self.expired.fetch_add(count as u64, Ordering::Relaxed);
                debug!("만료 스윕 완료: {}건", count);
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                error!("만료 스윕 실패: {}", e);
            }
        }

        match self.orchestrator.reconcile_confirmed().await {
            Ok(report) => {
                self.reconciled.fetch_add(report.finalized as u64, Ordering::Relaxed);
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                error!("대사 작업 실패: {}", e);
            }
        }
    }

    pub fn stats(&self) -> MaintenanceStats {
        MaintenanceStats {
            runs: self.runs.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            reconciled: self.reconciled.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
