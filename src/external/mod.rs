//! 외부 시스템 연동 모듈
//!
//! 리스크 설정 제공자와 브로커 주문 실행 클라이언트의 호출 계약을 정의합니다.
//! 실제 구현(재시도/백오프 등)은 이 서비스 밖에 있고, 여기서는 인터페이스와
//! 개발/테스트용 구현만 제공합니다.

pub mod brokerage;
pub mod risk;

pub use brokerage::{BrokerageClient, BrokerageFill, BrokerageOrderRequest, PaperBrokerage};
pub use risk::{RiskProfile, RiskProvider, StaticRiskProvider};

/// 외부 호출 오류
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExternalError {
    #[error("외부 서비스 응답 시간 초과 ({0}ms)")]
    Timeout(u64),
    #[error("외부 서비스 사용 불가: {0}")]
    Unavailable(String),
    #[error("주문 거부: {0}")]
    Rejected(String),
}
