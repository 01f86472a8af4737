//! 거래 승인 도메인 모델
//!
//! 매수/매도 방향, 주문 타입, 승인 상태 머신, 임시 저장소에 보관되는
//! 거래 스냅샷, 감사 로그 액션을 정의합니다.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 매수/매도 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// 매수 주문
    Buy,
    /// 매도 주문
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// 주문 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// 시장가 주문
    Market,
    /// 지정가 주문
    Limit,
    /// 스톱 주문
    Stop,
    /// 스톱 지정가 주문
    StopLimit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::Stop => "stop",
            OrderType::StopLimit => "stop_limit",
        }
    }

    /// 가격 지정이 필수인 주문 타입
    pub fn requires_limit_price(&self) -> bool {
        matches!(self, OrderType::Limit | OrderType::StopLimit)
    }
}

/// 승인 상태
///
/// `Pending`에서만 출발하며 `Executed`, `Expired`, `Cancelled`는 종료 상태입니다.
/// `Confirmed`는 브로커 호출과 대사 작업만 다음 상태로 넘길 수 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    Pending,
    Confirmed,
    Executed,
    Expired,
    Cancelled,
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::Pending => "pending",
            AuthorizationStatus::Confirmed => "confirmed",
            AuthorizationStatus::Executed => "executed",
            AuthorizationStatus::Expired => "expired",
            AuthorizationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Executed | AuthorizationStatus::Expired | AuthorizationStatus::Cancelled
        )
    }
}

/// 문자열 → 열거형 파싱 오류 (DB 값 손상 등)
#[derive(Debug, thiserror::Error)]
#[error("알 수 없는 {kind} 값: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! impl_str_enum {
    ($ty:ty, $kind:literal, [$($variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ParseEnumError { kind: $kind, value: s.to_string() })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_str_enum!(Side, "side", [Side::Buy, Side::Sell]);
impl_str_enum!(
    OrderType,
    "order_type",
    [OrderType::Market, OrderType::Limit, OrderType::Stop, OrderType::StopLimit]
);
impl_str_enum!(
    AuthorizationStatus,
    "status",
    [
        AuthorizationStatus::Pending,
        AuthorizationStatus::Confirmed,
        AuthorizationStatus::Executed,
        AuthorizationStatus::Expired,
        AuthorizationStatus::Cancelled,
    ]
);

/// 승인 시점에 고정되는 거래 파라미터 스냅샷
///
/// 실행 단계는 요청 본문이 아니라 이 스냅샷으로 브로커를 호출합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDetails {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub limit_price: Option<Decimal>,
}

/// 영속화된 거래 승인
#[derive(Debug, Clone, Serialize)]
pub struct TradeAuthorization {
    pub id: String,
    pub user_id: String,
    pub brokerage_connection_id: String,
    pub details: TradeDetails,
    #[serde(skip_serializing)]
    pub auth_token_hash: String,
    pub status: AuthorizationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub executed_price: Option<Decimal>,
    pub executed_quantity: Option<Decimal>,
    pub broker_order_id: Option<String>,
    pub error_message: Option<String>,
}

/// 임시 저장소에만 존재하는 비밀 엔트리
#[derive(Clone, Serialize, Deserialize)]
pub struct EphemeralSecretEntry {
    pub token: String,
    pub user_id: String,
    pub trade_authorization_id: String,
    pub trade_details: TradeDetails,
    pub created_at: i64,
    pub expires_at: i64,
    pub ttl_seconds: u64,
}

impl fmt::Debug for EphemeralSecretEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralSecretEntry")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("trade_authorization_id", &self.trade_authorization_id)
            .field("trade_details", &self.trade_details)
            .field("expires_at", &self.expires_at)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

/// 감사 로그 액션
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AuthCreated,
    AuthConfirmed,
    AuthFailed,
    AuthCancelled,
    AuthExpired,
    TradeExecuted,
    TradeFailed,
    TradeReconciled,
    PinLocked,
    PinChanged,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AuthCreated => "auth_created",
            AuditAction::AuthConfirmed => "auth_confirmed",
            AuditAction::AuthFailed => "auth_failed",
            AuditAction::AuthCancelled => "auth_cancelled",
            AuditAction::AuthExpired => "auth_expired",
            AuditAction::TradeExecuted => "trade_executed",
            AuditAction::TradeFailed => "trade_failed",
            AuditAction::TradeReconciled => "trade_reconciled",
            AuditAction::PinLocked => "pin_locked",
            AuditAction::PinChanged => "pin_changed",
        }
    }
}

impl_str_enum!(
    AuditAction,
    "audit_action",
    [
        AuditAction::AuthCreated,
        AuditAction::AuthConfirmed,
        AuditAction::AuthFailed,
        AuditAction::AuthCancelled,
        AuditAction::AuthExpired,
        AuditAction::TradeExecuted,
        AuditAction::TradeFailed,
        AuditAction::TradeReconciled,
        AuditAction::PinLocked,
        AuditAction::PinChanged,
    ]
);

/// 감사 로그 항목
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub trade_authorization_id: Option<String>,
    pub user_id: String,
    pub action: AuditAction,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// `authorize` 결과 (원문 토큰이 노출되는 유일한 지점)
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationGrant {
    pub trade_authorization_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub trade_details: TradeDetails,
}

/// `execute` 결과
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub status: AuthorizationStatus,
    pub trade_authorization_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub broker_order_id: String,
    pub executed_at: DateTime<Utc>,
}

/// `authorize` 입력
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeRequest {
    pub user_id: String,
    pub brokerage_connection_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub limit_price: Option<Decimal>,
}
