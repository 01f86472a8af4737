use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::clock::ms_to_datetime;
use crate::error::TradeAuthError;
use crate::trade_auth::model::{
    AuditAction, AuditLogEntry, AuthorizationStatus, OrderType, Side, TradeAuthorization,
    TradeDetails,
};

/// 거래 승인 DB 모델
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradeAuthorizationRecord {
    pub id: String,
    pub user_id: String,
    pub brokerage_connection_id: String,
    pub symbol: String,
    pub side: String,
    pub quantity: String,
    pub order_type: String,
    pub limit_price: Option<String>,
    pub auth_token_hash: String,
    pub status: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub confirmed_at: Option<i64>,
    pub executed_at: Option<i64>,
    pub executed_price: Option<String>,
    pub executed_quantity: Option<String>,
    pub broker_order_id: Option<String>,
    pub error_message: Option<String>,
    /// 마지막 대사 조회 시각
    pub reconcile_checked_at: Option<i64>,
}

impl TradeAuthorizationRecord {
    /// 새 pending 레코드
    pub fn new_pending(
        id: String,
        user_id: String,
        brokerage_connection_id: String,
        details: &TradeDetails,
        auth_token_hash: String,
        created_at: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            id,
            user_id,
            brokerage_connection_id,
            symbol: details.symbol.clone(),
            side: details.side.as_str().to_string(),
            quantity: details.quantity.to_string(),
            order_type: details.order_type.as_str().to_string(),
            limit_price: details.limit_price.map(|p| p.to_string()),
            auth_token_hash,
            status: AuthorizationStatus::Pending.as_str().to_string(),
            created_at,
            expires_at,
            confirmed_at: None,
            executed_at: None,
            executed_price: None,
            executed_quantity: None,
            broker_order_id: None,
            error_message: None,
            reconcile_checked_at: None,
        }
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, TradeAuthError> {
    Decimal::from_str(value)
        .map_err(|_| TradeAuthError::CorruptRecord(format!("{} 값이 숫자가 아님: {}", field, value)))
}

fn parse_optional_decimal(field: &str, value: Option<&str>) -> Result<Option<Decimal>, TradeAuthError> {
    value.map(|v| parse_decimal(field, v)).transpose()
}

impl TryFrom<TradeAuthorizationRecord> for TradeAuthorization {
    type Error = TradeAuthError;

    fn try_from(record: TradeAuthorizationRecord) -> Result<Self, Self::Error> {
        let corrupt = |e: crate::trade_auth::model::ParseEnumError| TradeAuthError::CorruptRecord(e.to_string());

        Ok(Self {
            details: TradeDetails {
                symbol: record.symbol,
                side: Side::from_str(&record.side).map_err(corrupt)?,
                quantity: parse_decimal("quantity", &record.quantity)?,
                order_type: OrderType::from_str(&record.order_type).map_err(corrupt)?,
                limit_price: parse_optional_decimal("limit_price", record.limit_price.as_deref())?,
            },
            status: AuthorizationStatus::from_str(&record.status).map_err(corrupt)?,
            executed_price: parse_optional_decimal("executed_price", record.executed_price.as_deref())?,
            executed_quantity: parse_optional_decimal("executed_quantity", record.executed_quantity.as_deref())?,
            id: record.id,
            user_id: record.user_id,
            brokerage_connection_id: record.brokerage_connection_id,
            auth_token_hash: record.auth_token_hash,
            created_at: ms_to_datetime(record.created_at),
            expires_at: ms_to_datetime(record.expires_at),
            confirmed_at: record.confirmed_at.map(ms_to_datetime),
            executed_at: record.executed_at.map(ms_to_datetime),
            broker_order_id: record.broker_order_id,
            error_message: record.error_message,
        })
    }
}

/// 거래 PIN DB 모델
#[derive(Debug, Clone, FromRow)]
pub struct UserTradePinRecord {
    pub user_id: String,
    pub pin_hash: String,
    pub failed_attempts: i64,
    pub locked_until: Option<i64>,
    pub updated_at: i64,
}

/// 감사 로그 DB 모델
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogRecord {
    pub id: i64,
    pub trade_authorization_id: Option<String>,
    pub user_id: String,
    pub action: String,
    pub details: String,
    pub created_at: i64,
}

impl TryFrom<AuditLogRecord> for AuditLogEntry {
    type Error = TradeAuthError;

    fn try_from(record: AuditLogRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            trade_authorization_id: record.trade_authorization_id,
            user_id: record.user_id,
            action: AuditAction::from_str(&record.action)
                .map_err(|e| TradeAuthError::CorruptRecord(e.to_string()))?,
            details: serde_json::from_str(&record.details)?,
            created_at: ms_to_datetime(record.created_at),
        })
    }
}

/// 브로커 연결 DB 모델
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BrokerageConnectionRecord {
    pub id: String,
    pub user_id: String,
    pub broker_name: String,
    pub status: String,
    pub created_at: i64,
}

impl BrokerageConnectionRecord {
    pub const STATUS_ACTIVE: &'static str = "active";

    pub fn is_active(&self) -> bool {
        self.status == Self::STATUS_ACTIVE
    }
}
