//! 거래 승인 서비스 오류 타입
//!
//! 상태 충돌(없음/만료/처리됨)은 `NotFoundOrAlreadyProcessed` 하나로 합쳐
//! 존재 여부가 노출되지 않게 합니다. 비밀값은 어떤 메시지에도 포함하지 않습니다.

use chrono::{DateTime, Utc};

use crate::external::ExternalError;
use crate::token_store::TokenStoreError;

/// 공개 연산 오류
#[derive(Debug, thiserror::Error)]
pub enum TradeAuthError {
    #[error("입력 검증 실패: {0}")]
    Validation(String),
    #[error("활성 브로커 연결이 없습니다")]
    InvalidConnection,
    #[error("리스크 한도 초과: {0}")]
    RiskLimitExceeded(String),
    #[error("승인을 찾을 수 없거나 이미 처리되었습니다")]
    NotFoundOrAlreadyProcessed,
    #[error("승인 토큰이 올바르지 않습니다")]
    InvalidToken,
    #[error("승인 토큰이 만료되었습니다")]
    TokenExpired,
    #[error("PIN이 올바르지 않습니다 (남은 시도: {attempts_remaining})")]
    InvalidPin { attempts_remaining: u32 },
    #[error("계정이 잠겼습니다 (해제 시각: {locked_until})")]
    AccountLocked { locked_until: DateTime<Utc> },
    #[error("거래를 확정하지 못했습니다. 고객센터에 문의하세요")]
    Brokerage(#[source] ExternalError),
    #[error("외부 서비스 오류: {0}")]
    External(#[from] ExternalError),
    #[error("토큰 저장소 오류: {0}")]
    TokenStore(#[from] TokenStoreError),
    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),
    #[error("직렬화 오류: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("저장된 데이터 손상: {0}")]
    CorruptRecord(String),
}

impl TradeAuthError {
    /// 클라이언트에 노출하는 안정적인 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            TradeAuthError::Validation(_) => "VALIDATION_ERROR",
            TradeAuthError::InvalidConnection => "INVALID_CONNECTION",
            TradeAuthError::RiskLimitExceeded(_) => "RISK_LIMIT_EXCEEDED",
            TradeAuthError::NotFoundOrAlreadyProcessed => "NOT_FOUND_OR_ALREADY_PROCESSED",
            TradeAuthError::InvalidToken => "INVALID_TOKEN",
            TradeAuthError::TokenExpired => "TOKEN_EXPIRED",
            TradeAuthError::InvalidPin { .. } => "INVALID_PIN",
            TradeAuthError::AccountLocked { .. } => "ACCOUNT_LOCKED",
            TradeAuthError::Brokerage(_) => "BROKERAGE_ERROR",
            TradeAuthError::External(_)
            | TradeAuthError::TokenStore(_)
            | TradeAuthError::Database(_)
            | TradeAuthError::Serialization(_)
            | TradeAuthError::CorruptRecord(_) => "INTERNAL_ERROR",
        }
    }

    /// 내부 오류 여부 (상세 메시지를 클라이언트에 보내지 않음)
    pub fn is_internal(&self) -> bool {
        self.code() == "INTERNAL_ERROR"
    }
}

pub type TradeAuthResult<T> = Result<T, TradeAuthError>;
