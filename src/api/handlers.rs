use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use log::error;

use crate::api::models::*;
use crate::error::TradeAuthError;
use crate::server::ServerState;
use crate::trade_auth::model::{
    AuditLogEntry, AuthorizationGrant, AuthorizationStatus, ExecutionResult, TradeAuthorization,
};

/// 호출자 식별 헤더 (세션 인증은 앞단 게이트웨이에서 처리)
pub const USER_ID_HEADER: &str = "x-user-id";

type ApiError = (StatusCode, Json<ErrorResponse>);

/// 헤더에서 사용자 ID 추출
fn user_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("UNAUTHENTICATED", "사용자 식별 헤더가 없습니다")),
            )
        })
}

/// 도메인 오류 → HTTP 응답
pub fn error_response(err: TradeAuthError) -> ApiError {
    let status = match &err {
        TradeAuthError::Validation(_) | TradeAuthError::InvalidConnection => StatusCode::BAD_REQUEST,
        TradeAuthError::RiskLimitExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TradeAuthError::NotFoundOrAlreadyProcessed => StatusCode::NOT_FOUND,
        TradeAuthError::InvalidToken | TradeAuthError::InvalidPin { .. } => StatusCode::UNAUTHORIZED,
        TradeAuthError::TokenExpired => StatusCode::GONE,
        TradeAuthError::AccountLocked { .. } => StatusCode::LOCKED,
        TradeAuthError::Brokerage(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    // 내부 오류 상세는 로그에만 남김
    let message = if err.is_internal() {
        error!("내부 오류: {}", err);
        "일시적인 오류가 발생했습니다. 잠시 후 다시 시도하세요".to_string()
    } else {
        err.to_string()
    };

    let mut body = ErrorResponse::new(err.code(), message);
    match err {
        TradeAuthError::InvalidPin { attempts_remaining } => {
            body.attempts_remaining = Some(attempts_remaining);
        }
        TradeAuthError::AccountLocked { locked_until } => {
            body.locked_until = Some(locked_until);
        }
        _ => {}
    }

    (status, Json(body))
}

/// 헬스 체크 핸들러
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// 거래 승인 발급 핸들러
pub async fn create_authorization(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<AuthorizeBody>,
) -> Result<(StatusCode, Json<AuthorizationGrant>), ApiError> {
    let user_id = user_id(&headers)?;

    let grant = state
        .orchestrator
        .authorize(payload.into_request(user_id))
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(grant)))
}

/// 거래 실행 핸들러
pub async fn execute_authorization(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(trade_authorization_id): Path<String>,
    Json(payload): Json<ExecuteBody>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let user_id = user_id(&headers)?;

    let result = state
        .orchestrator
        .execute(
            &user_id,
            &trade_authorization_id,
            &payload.token,
            payload.pin.as_deref(),
        )
        .await
        .map_err(error_response)?;

    Ok(Json(result))
}

/// 승인 취소 핸들러
pub async fn cancel_authorization(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(trade_authorization_id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let user_id = user_id(&headers)?;

    state
        .orchestrator
        .cancel(&user_id, &trade_authorization_id)
        .await
        .map_err(error_response)?;

    Ok(Json(CancelResponse {
        trade_authorization_id,
        status: AuthorizationStatus::Cancelled,
        message: "거래 승인이 취소되었습니다".to_string(),
    }))
}

/// 승인 상태 조회 핸들러
pub async fn get_authorization(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(trade_authorization_id): Path<String>,
) -> Result<Json<TradeAuthorization>, ApiError> {
    let user_id = user_id(&headers)?;

    let authorization = state
        .orchestrator
        .get_authorization(&user_id, &trade_authorization_id)
        .await
        .map_err(error_response)?;

    Ok(Json(authorization))
}

/// 승인 감사 이력 조회 핸들러
pub async fn get_audit_trail(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(trade_authorization_id): Path<String>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let user_id = user_id(&headers)?;

    let entries = state
        .orchestrator
        .audit_trail(&user_id, &trade_authorization_id)
        .await
        .map_err(error_response)?;

    Ok(Json(entries))
}

/// 거래 PIN 설정/변경 핸들러
pub async fn set_trade_pin(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<SetPinBody>,
) -> Result<Json<SetPinResponse>, ApiError> {
    let user_id = user_id(&headers)?;

    state
        .orchestrator
        .set_or_change_pin(&user_id, &payload.new_pin, payload.current_pin.as_deref())
        .await
        .map_err(error_response)?;

    Ok(Json(SetPinResponse {
        status: "OK".to_string(),
        message: "거래 PIN이 저장되었습니다".to_string(),
    }))
}
