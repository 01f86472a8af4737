//! 사용자별 리스크 한도 제공자

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::ExternalError;

/// 사용자 리스크 프로필
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// 단일 주문이 포트폴리오에서 차지할 수 있는 최대 비중 (%)
    pub max_position_pct: Decimal,
    /// 24시간 내 승인 가능한 최대 거래 수
    pub daily_trade_limit: u32,
    /// 평가 금액 (알 수 없으면 비중 검사 생략)
    pub portfolio_value: Option<Decimal>,
}

impl Default for RiskProfile {
    fn default() -> Self {
        Self {
            max_position_pct: Decimal::from(25),
            daily_trade_limit: 20,
            portfolio_value: None,
        }
    }
}

/// 리스크/설정 제공자
#[async_trait]
pub trait RiskProvider: Send + Sync {
    async fn risk_profile(&self, user_id: &str) -> Result<RiskProfile, ExternalError>;
}

/// 고정 프로필 제공자 (사용자별 덮어쓰기 가능)
#[derive(Debug, Default)]
pub struct StaticRiskProvider {
    default_profile: RiskProfile,
    overrides: RwLock<HashMap<String, RiskProfile>>,
}

impl StaticRiskProvider {
    pub fn new(default_profile: RiskProfile) -> Self {
        Self {
            default_profile,
            overrides: RwLock::new(HashMap::new()),
        }
    }

    pub async fn set_profile(&self, user_id: &str, profile: RiskProfile) {
        self.overrides.write().await.insert(user_id.to_string(), profile);
    }
}

#[async_trait]
impl RiskProvider for StaticRiskProvider {
    async fn risk_profile(&self, user_id: &str) -> Result<RiskProfile, ExternalError> {
        let overrides = self.overrides.read().await;
        Ok(overrides
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| self.default_profile.clone()))
    }
}
