use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::trade_auth::model::{AuthorizationStatus, AuthorizeRequest, OrderType, Side};

/// 거래 승인 요청 (사용자는 `x-user-id` 헤더로 식별)
#[derive(Debug, Deserialize, Serialize)]
pub struct AuthorizeBody {
    pub brokerage_connection_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub order_type: OrderType,
    #[serde(default)]
    pub limit_price: Option<Decimal>,
}

impl AuthorizeBody {
    pub fn into_request(self, user_id: String) -> AuthorizeRequest {
        AuthorizeRequest {
            user_id,
            brokerage_connection_id: self.brokerage_connection_id,
            symbol: self.symbol,
            side: self.side,
            quantity: self.quantity,
            order_type: self.order_type,
            limit_price: self.limit_price,
        }
    }
}

/// 거래 실행 요청
#[derive(Deserialize, Serialize)]
pub struct ExecuteBody {
    pub token: String,
    #[serde(default)]
    pub pin: Option<String>,
}

/// 승인 취소 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub trade_authorization_id: String,
    pub status: AuthorizationStatus,
    pub message: String,
}

/// 거래 PIN 설정/변경 요청
#[derive(Deserialize, Serialize)]
pub struct SetPinBody {
    pub new_pin: String,
    #[serde(default)]
    pub current_pin: Option<String>,
}

/// 거래 PIN 설정/변경 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct SetPinResponse {
    pub status: String,
    pub message: String,
}

/// 헬스 체크 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// 에러 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attempts_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub locked_until: Option<DateTime<Utc>>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            attempts_remaining: None,
            locked_until: None,
        }
    }
}
