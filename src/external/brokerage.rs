//! 브로커 주문 실행 클라이언트
//!
//! 승인 ID를 클라이언트 주문 ID로 넘기므로, 응답을 받지 못한 주문도
//! `find_order`로 나중에 체결 여부를 확인할 수 있습니다.

use std::collections::HashMap;

use async_trait::async_trait;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ExternalError;
use crate::trade_auth::model::{OrderType, Side};

/// 브로커 주문 요청
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerageOrderRequest {
    /// 멱등 키 (거래 승인 ID)
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub limit_price: Option<Decimal>,
}

/// 체결 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerageFill {
    pub broker_order_id: String,
    pub fill_price: Decimal,
    pub filled_quantity: Decimal,
}

/// 브로커 실행 클라이언트
#[async_trait]
pub trait BrokerageClient: Send + Sync {
    /// 주문 제출
    async fn place_order(&self, request: &BrokerageOrderRequest) -> Result<BrokerageFill, ExternalError>;

    /// 클라이언트 주문 ID로 체결 조회 (없으면 None)
    async fn find_order(&self, client_order_id: &str) -> Result<Option<BrokerageFill>, ExternalError>;
}

/// 모의 체결 브로커 (로컬 개발용)
///
/// 지정가가 있으면 그 가격에, 없으면 등록된 기준가에 전량 체결합니다.
#[derive(Debug, Default)]
pub struct PaperBrokerage {
    quotes: RwLock<HashMap<String, Decimal>>,
    fills: RwLock<HashMap<String, BrokerageFill>>,
}

impl PaperBrokerage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기준가 등록
    pub async fn set_quote(&self, symbol: &str, price: Decimal) {
        self.quotes.write().await.insert(symbol.to_uppercase(), price);
    }
}

#[async_trait]
impl BrokerageClient for PaperBrokerage {
    async fn place_order(&self, request: &BrokerageOrderRequest) -> Result<BrokerageFill, ExternalError> {
        // 같은 클라이언트 주문 ID는 한 번만 체결
        if let Some(existing) = self.fills.read().await.get(&request.client_order_id) {
            return Ok(existing.clone());
        }

        let price = match request.limit_price {
            Some(price) => price,
            None => self
                .quotes
                .read()
                .await
                .get(&request.symbol)
                .copied()
                .ok_or_else(|| ExternalError::Rejected(format!("시세 없음: {}", request.symbol)))?,
        };

        let fill = BrokerageFill {
            broker_order_id: format!("PAPER-{}", Uuid::new_v4()),
            fill_price: price,
            filled_quantity: request.quantity,
        };
        self.fills
            .write()
            .await
            .insert(request.client_order_id.clone(), fill.clone());

        info!("모의 체결: {} {} {} @ {}", request.side, request.quantity, request.symbol, price);
        Ok(fill)
    }

    async fn find_order(&self, client_order_id: &str) -> Result<Option<BrokerageFill>, ExternalError> {
        Ok(self.fills.read().await.get(client_order_id).cloned())
    }
}
