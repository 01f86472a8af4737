//! 거래 승인 및 실행 서비스
//!
//! 단기 승인 토큰(기본 5분)과 선택적 거래 PIN으로 보호되는 2단계 거래 실행.
//! 토큰 원문은 임시 저장소에만 존재하고 DB에는 SHA-256 해시만 남습니다.

pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod external;
pub mod security;
pub mod server;
pub mod token_store;
pub mod trade_auth;

pub use error::{TradeAuthError, TradeAuthResult};
