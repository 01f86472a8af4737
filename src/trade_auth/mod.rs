//! 거래 승인 및 실행
//!
//! 단기 승인 토큰과 선택적 PIN으로 보호되는 2단계 거래 실행 서브시스템

pub mod audit;
pub mod maintenance;
pub mod model;
pub mod orchestrator;
pub mod pin_guard;

pub use audit::AuditLog;
pub use maintenance::{MaintenanceStats, MaintenanceWorker};
pub use model::{
    AuditAction, AuditLogEntry, AuthorizationGrant, AuthorizationStatus, AuthorizeRequest,
    EphemeralSecretEntry, ExecutionResult, OrderType, Side, TradeAuthorization, TradeDetails,
};
pub use orchestrator::{ReconcileReport, TradeAuthorizationOrchestrator};
pub use pin_guard::PinGuard;
