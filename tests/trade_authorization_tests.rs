//! 거래 승인 통합 테스트
//!
//! 인메모리 SQLite와 수동 시계로 승인 → 실행 전 과정을 검증합니다.

mod common;

use std::time::Duration;

use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{add_connection, BrokerMode, Harness, USER};
use trade_auth::config::AuthConfig;
use trade_auth::external::RiskProfile;
use trade_auth::token_store::secret_path;
use trade_auth::trade_auth::{AuthorizationStatus, OrderType, Side};
use trade_auth::TradeAuthError;

/// 시나리오: ABCD 10주 매수 승인 → 실행
#[tokio::test]
async fn test_buy_scenario_executes_with_audit_trail() {
    let h = Harness::new().await;

    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();
    assert_eq!(grant.ttl_seconds, 300);
    assert_eq!(grant.trade_details.symbol, "ABCD");
    assert_eq!(grant.token.len(), 64);
    assert!(h.store.contains(&secret_path(USER, &grant.trade_authorization_id)).await);

    h.clock.advance_secs(10);
    let result = h
        .orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await
        .unwrap();

    assert_eq!(result.status, AuthorizationStatus::Executed);
    assert_eq!(result.symbol, "ABCD");
    assert_eq!(result.side, Side::Buy);
    assert_eq!(result.quantity, Decimal::from(10));
    assert_eq!(result.price, dec!(150.25));
    assert!(result.broker_order_id.starts_with("BRK-"));

    let view = h
        .orchestrator
        .get_authorization(USER, &grant.trade_authorization_id)
        .await
        .unwrap();
    assert_eq!(view.status, AuthorizationStatus::Executed);
    assert!(view.confirmed_at.is_some());
    assert_eq!(view.executed_price, Some(dec!(150.25)));
    assert_eq!(view.broker_order_id.as_deref(), Some(result.broker_order_id.as_str()));

    assert_eq!(
        h.audit_actions(&grant.trade_authorization_id).await,
        vec!["auth_created", "auth_confirmed", "trade_executed"]
    );

    // 비밀 엔트리는 소비됨
    assert!(!h.store.contains(&secret_path(USER, &grant.trade_authorization_id)).await);
}

/// 브로커는 승인 시점 스냅샷과 승인 ID(멱등 키)로 호출됨
#[tokio::test]
async fn test_brokerage_called_with_authorized_snapshot() {
    let h = Harness::new().await;

    let mut request = h.buy_request();
    request.symbol = " abcd ".into();
    request.order_type = OrderType::Limit;
    request.limit_price = Some(dec!(149.5));
    let grant = h.orchestrator.authorize(request).await.unwrap();

    h.orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await
        .unwrap();

    let sent = h.brokerage.last_request.lock().await.clone().unwrap();
    assert_eq!(sent.client_order_id, grant.trade_authorization_id);
    assert_eq!(sent.symbol, "ABCD");
    assert_eq!(sent.order_type, OrderType::Limit);
    assert_eq!(sent.limit_price, Some(dec!(149.5)));
}

/// 시나리오: TTL 경과 후 실행 → 실패, expired, trade_executed 없음
#[tokio::test]
async fn test_execute_after_ttl_fails_and_expires_row() {
    let h = Harness::new().await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    h.clock.advance_secs(301);

    let err = h
        .orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TradeAuthError::TokenExpired | TradeAuthError::NotFoundOrAlreadyProcessed
    ));

    assert_eq!(h.status_of(&grant.trade_authorization_id).await, "expired");
    let actions = h.audit_actions(&grant.trade_authorization_id).await;
    assert_eq!(actions, vec!["auth_created", "auth_expired"]);
    assert!(!actions.iter().any(|a| a == "trade_executed"));
    assert_eq!(h.brokerage.call_count(), 0);
}

/// 행의 만료 시각이 지나지 않았어도 비밀 엔트리가 만료되었으면 거부
#[tokio::test]
async fn test_expired_secret_entry_rejected_exactly_at_deadline() {
    let h = Harness::new().await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    // 정확히 만료 시각: 스윕 대상 (expires_at <= now)
    h.clock.advance_secs(300);
    assert!(h
        .orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await
        .is_err());
    assert_eq!(h.status_of(&grant.trade_authorization_id).await, "expired");
}

/// 동시 실행 N회 → 정확히 한 번만 체결
#[tokio::test]
async fn test_concurrent_executes_are_at_most_once() {
    let h = Harness::new().await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    let attempts = (0..8).map(|_| {
        let orchestrator = h.orchestrator.clone();
        let id = grant.trade_authorization_id.clone();
        let token = grant.token.clone();
        tokio::spawn(async move { orchestrator.execute(USER, &id, &token, None).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let executed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(executed, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(err, TradeAuthError::TokenExpired | TradeAuthError::NotFoundOrAlreadyProcessed),
            "예상치 못한 오류: {:?}",
            err
        );
    }

    assert_eq!(h.brokerage.call_count(), 1);
    assert_eq!(h.status_of(&grant.trade_authorization_id).await, "executed");
    let actions = h.audit_actions(&grant.trade_authorization_id).await;
    assert_eq!(actions.iter().filter(|a| *a == "trade_executed").count(), 1);
}

/// 실행 완료 후 같은 토큰 재사용 불가
#[tokio::test]
async fn test_replay_after_execution_is_rejected() {
    let h = Harness::new().await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    h.orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await
        .unwrap();

    assert!(matches!(
        h.orchestrator
            .execute(USER, &grant.trade_authorization_id, &grant.token, None)
            .await,
        Err(TradeAuthError::NotFoundOrAlreadyProcessed)
    ));
    assert_eq!(h.brokerage.call_count(), 1);
}

/// 토큰 불일치 → InvalidToken, 엔트리는 소비되지 않음
#[tokio::test]
async fn test_wrong_token_does_not_consume_secret() {
    let h = Harness::new().await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    let wrong = "0".repeat(64);
    assert!(matches!(
        h.orchestrator
            .execute(USER, &grant.trade_authorization_id, &wrong, None)
            .await,
        Err(TradeAuthError::InvalidToken)
    ));
    assert_eq!(h.status_of(&grant.trade_authorization_id).await, "pending");
    assert!(h.store.contains(&secret_path(USER, &grant.trade_authorization_id)).await);

    let actions = h.audit_actions(&grant.trade_authorization_id).await;
    assert_eq!(actions, vec!["auth_created", "auth_failed"]);

    // 올바른 토큰으로는 여전히 실행 가능
    h.orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await
        .unwrap();
}

/// 다른 사용자는 승인을 실행/조회/취소할 수 없음
#[tokio::test]
async fn test_other_user_cannot_touch_authorization() {
    let h = Harness::new().await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    assert!(matches!(
        h.orchestrator
            .execute("intruder", &grant.trade_authorization_id, &grant.token, None)
            .await,
        Err(TradeAuthError::NotFoundOrAlreadyProcessed)
    ));
    assert!(matches!(
        h.orchestrator.cancel("intruder", &grant.trade_authorization_id).await,
        Err(TradeAuthError::NotFoundOrAlreadyProcessed)
    ));
    assert!(matches!(
        h.orchestrator.audit_trail("intruder", &grant.trade_authorization_id).await,
        Err(TradeAuthError::NotFoundOrAlreadyProcessed)
    ));
    assert_eq!(h.status_of(&grant.trade_authorization_id).await, "pending");
}

/// 원문 토큰과 PIN은 DB/감사 로그/조회 응답 어디에도 남지 않음
#[tokio::test]
async fn test_token_and_pin_never_persisted() {
    let h = Harness::new().await;
    h.orchestrator.set_or_change_pin(USER, "482913", None).await.unwrap();

    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();
    let _ = h
        .orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, Some("111111"))
        .await;

    let second = h.orchestrator.authorize(h.buy_request()).await.unwrap();
    h.orchestrator
        .execute(USER, &second.trade_authorization_id, &second.token, Some("482913"))
        .await
        .unwrap();

    let persisted = h.persisted_text().await;
    for secret in [&grant.token, &second.token] {
        assert!(!persisted.contains(secret.as_str()));
    }
    assert!(!persisted.contains("482913"));
    assert!(!persisted.contains("111111"));

    let view = h
        .orchestrator
        .get_authorization(USER, &second.trade_authorization_id)
        .await
        .unwrap();
    let json = serde_json::to_string(&view).unwrap();
    assert!(!json.contains(&second.token));
    assert!(!json.contains("auth_token_hash"));
}

/// 5회 연속 PIN 실패 → 잠금, 잠금 중에는 올바른 PIN도 거부, 해제 후 성공
#[tokio::test]
async fn test_pin_lockout_through_execute() {
    let h = Harness::new().await;
    h.orchestrator.set_or_change_pin(USER, "1234", None).await.unwrap();

    for attempt in 1..=5u32 {
        let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();
        match h
            .orchestrator
            .execute(USER, &grant.trade_authorization_id, &grant.token, Some("0000"))
            .await
        {
            Err(TradeAuthError::InvalidPin { attempts_remaining }) => {
                assert_eq!(attempts_remaining, 5 - attempt)
            }
            other => panic!("예상치 못한 결과: {:?}", other),
        }
        // PIN 실패는 행을 pending에서 진행시키지 않음
        assert_eq!(h.status_of(&grant.trade_authorization_id).await, "pending");
    }

    let locked = h.orchestrator.authorize(h.buy_request()).await.unwrap();
    assert!(matches!(
        h.orchestrator
            .execute(USER, &locked.trade_authorization_id, &locked.token, Some("1234"))
            .await,
        Err(TradeAuthError::AccountLocked { .. })
    ));
    let actions = h.audit_actions(&locked.trade_authorization_id).await;
    assert_eq!(actions, vec!["auth_created", "auth_failed"]);

    h.clock.advance_secs(30 * 60 + 1);
    let fresh = h.orchestrator.authorize(h.buy_request()).await.unwrap();
    h.orchestrator
        .execute(USER, &fresh.trade_authorization_id, &fresh.token, Some("1234"))
        .await
        .unwrap();

    // 카운터 초기화 확인: 한 번 틀리면 남은 시도 4
    let next = h.orchestrator.authorize(h.buy_request()).await.unwrap();
    assert!(matches!(
        h.orchestrator
            .execute(USER, &next.trade_authorization_id, &next.token, Some("9999"))
            .await,
        Err(TradeAuthError::InvalidPin { attempts_remaining: 4 })
    ));
}

/// PIN이 설정된 사용자가 PIN 없이 실행 → InvalidPin, 토큰은 소비됨
#[tokio::test]
async fn test_missing_pin_spends_token() {
    let h = Harness::new().await;
    h.orchestrator.set_or_change_pin(USER, "1234", None).await.unwrap();
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    assert!(matches!(
        h.orchestrator
            .execute(USER, &grant.trade_authorization_id, &grant.token, None)
            .await,
        Err(TradeAuthError::InvalidPin { attempts_remaining: 5 })
    ));

    // 같은 토큰으로 재시도 불가 (재승인 필요)
    assert!(matches!(
        h.orchestrator
            .execute(USER, &grant.trade_authorization_id, &grant.token, Some("1234"))
            .await,
        Err(TradeAuthError::TokenExpired)
    ));
    assert_eq!(h.brokerage.call_count(), 0);
}

/// 취소 후 실행 불가, 비밀 엔트리 삭제
#[tokio::test]
async fn test_cancel_then_execute() {
    let h = Harness::new().await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    h.orchestrator.cancel(USER, &grant.trade_authorization_id).await.unwrap();
    assert!(!h.store.contains(&secret_path(USER, &grant.trade_authorization_id)).await);

    assert!(matches!(
        h.orchestrator
            .execute(USER, &grant.trade_authorization_id, &grant.token, None)
            .await,
        Err(TradeAuthError::NotFoundOrAlreadyProcessed)
    ));
    assert!(matches!(
        h.orchestrator.cancel(USER, &grant.trade_authorization_id).await,
        Err(TradeAuthError::NotFoundOrAlreadyProcessed)
    ));
    assert_eq!(
        h.audit_actions(&grant.trade_authorization_id).await,
        vec!["auth_created", "auth_cancelled"]
    );
}

/// 취소와 실행 경쟁 → 정확히 하나만 성공
#[tokio::test]
async fn test_cancel_execute_race_has_single_winner() {
    for _ in 0..10 {
        let h = Harness::new().await;
        let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

        let exec = {
            let orchestrator = h.orchestrator.clone();
            let id = grant.trade_authorization_id.clone();
            let token = grant.token.clone();
            tokio::spawn(async move { orchestrator.execute(USER, &id, &token, None).await.map(|_| ()) })
        };
        let cancel = {
            let orchestrator = h.orchestrator.clone();
            let id = grant.trade_authorization_id.clone();
            tokio::spawn(async move { orchestrator.cancel(USER, &id).await })
        };

        let (exec, cancel) = (exec.await.unwrap(), cancel.await.unwrap());
        assert!(exec.is_ok() ^ cancel.is_ok(), "exec={:?} cancel={:?}", exec, cancel);
        if let Err(e) = exec {
            assert!(matches!(e, TradeAuthError::NotFoundOrAlreadyProcessed));
        }
        if let Err(e) = cancel {
            assert!(matches!(e, TradeAuthError::NotFoundOrAlreadyProcessed));
        }

        let status = h.status_of(&grant.trade_authorization_id).await;
        assert!(status == "executed" || status == "cancelled");
    }
}

/// 브로커 거부 → confirmed 유지 + 오류 메시지 + trade_failed
#[tokio::test]
async fn test_brokerage_failure_leaves_confirmed_row() {
    let h = Harness::with_broker(BrokerMode::Reject).await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    let err = h
        .orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TradeAuthError::Brokerage(_)));
    assert_eq!(err.code(), "BROKERAGE_ERROR");

    let view = h
        .orchestrator
        .get_authorization(USER, &grant.trade_authorization_id)
        .await
        .unwrap();
    assert_eq!(view.status, AuthorizationStatus::Confirmed);
    assert!(view.error_message.unwrap().contains("insufficient"));
    assert_eq!(
        h.audit_actions(&grant.trade_authorization_id).await,
        vec!["auth_created", "auth_confirmed", "trade_failed"]
    );

    // confirmed는 취소 불가
    assert!(matches!(
        h.orchestrator.cancel(USER, &grant.trade_authorization_id).await,
        Err(TradeAuthError::NotFoundOrAlreadyProcessed)
    ));
}

/// 브로커 응답 지연 → 제한 시간 후 BrokerageError
#[tokio::test]
async fn test_brokerage_timeout_is_bounded() {
    let config = AuthConfig {
        brokerage_timeout: Duration::from_millis(50),
        ..AuthConfig::default()
    };
    let h = Harness::with_config(config, BrokerMode::Hang).await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    let started = std::time::Instant::now();
    let err = h
        .orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TradeAuthError::Brokerage(_)));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(h.status_of(&grant.trade_authorization_id).await, "confirmed");
}

/// 응답이 유실된 체결은 대사 작업이 executed로 확정
#[tokio::test]
async fn test_reconcile_finalizes_lost_fill() {
    let h = Harness::with_broker(BrokerMode::LoseResponse).await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    assert!(h
        .orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await
        .is_err());
    assert_eq!(h.status_of(&grant.trade_authorization_id).await, "confirmed");

    // 대사 대기 시간 전에는 대상 아님
    let report = h.orchestrator.reconcile_confirmed().await.unwrap();
    assert_eq!(report.checked, 0);

    h.clock.advance_secs(121);
    let report = h.orchestrator.reconcile_confirmed().await.unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.finalized, 1);
    assert_eq!(report.unresolved, 0);

    let view = h
        .orchestrator
        .get_authorization(USER, &grant.trade_authorization_id)
        .await
        .unwrap();
    assert_eq!(view.status, AuthorizationStatus::Executed);
    assert!(view.error_message.is_none());
    assert_eq!(
        h.audit_actions(&grant.trade_authorization_id).await,
        vec!["auth_created", "auth_confirmed", "trade_failed", "trade_reconciled"]
    );

    // 재실행해도 변화 없음
    let report = h.orchestrator.reconcile_confirmed().await.unwrap();
    assert_eq!(report.checked, 0);
}

/// 브로커에 주문이 없으면 confirmed 유지, 재주문하지 않음
#[tokio::test]
async fn test_reconcile_leaves_unfilled_for_operator() {
    let h = Harness::with_broker(BrokerMode::Reject).await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();
    let _ = h
        .orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await;

    h.clock.advance_secs(121);
    let report = h.orchestrator.reconcile_confirmed().await.unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.finalized, 0);
    assert_eq!(report.unresolved, 1);
    assert_eq!(h.brokerage.call_count(), 1);

    let view = h
        .orchestrator
        .get_authorization(USER, &grant.trade_authorization_id)
        .await
        .unwrap();
    assert_eq!(view.status, AuthorizationStatus::Confirmed);
    assert!(view.error_message.is_some());
}

/// 미해결 건이 한 배치를 넘게 쌓여도 뒤의 유실 체결은 확정되고, 미해결 건은 재조회 간격 전까지 다시 보지 않음
#[tokio::test]
async fn test_reconcile_progresses_past_unresolved_rows() {
    const STUCK: usize = 105;

    let h = Harness::with_broker(BrokerMode::Reject).await;
    h.risk
        .set_profile(
            USER,
            RiskProfile {
                daily_trade_limit: 500,
                ..RiskProfile::default()
            },
        )
        .await;

    for _ in 0..STUCK {
        let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();
        assert!(h
            .orchestrator
            .execute(USER, &grant.trade_authorization_id, &grant.token, None)
            .await
            .is_err());
    }

    // 유실 체결은 미해결 건들보다 늦게 confirmed
    h.clock.advance_secs(1);
    h.brokerage.set_mode(BrokerMode::LoseResponse).await;
    let lost = h.orchestrator.authorize(h.buy_request()).await.unwrap();
    assert!(h
        .orchestrator
        .execute(USER, &lost.trade_authorization_id, &lost.token, None)
        .await
        .is_err());

    h.clock.advance_secs(121);
    let first = h.orchestrator.reconcile_confirmed().await.unwrap();
    assert_eq!(first.checked, 100);
    assert_eq!(first.finalized, 0);
    assert_eq!(first.unresolved, 100);

    let second = h.orchestrator.reconcile_confirmed().await.unwrap();
    assert_eq!(second.checked, STUCK - 100 + 1);
    assert_eq!(second.finalized, 1);
    assert_eq!(second.unresolved, STUCK - 100);
    assert_eq!(h.status_of(&lost.trade_authorization_id).await, "executed");

    // 모두 조회됨: 재조회 간격 전에는 대상 없음
    assert_eq!(h.orchestrator.reconcile_confirmed().await.unwrap().checked, 0);

    h.clock.advance_secs(15 * 60);
    let recheck = h.orchestrator.reconcile_confirmed().await.unwrap();
    assert_eq!(recheck.checked, 100);
    assert_eq!(recheck.finalized, 0);

    // 대사는 조회만 하고 재주문하지 않음
    assert_eq!(h.brokerage.call_count(), STUCK + 1);
}

/// 백그라운드 스윕 없이도, 스윕이 있어도 만료는 한 번만 기록
#[tokio::test]
async fn test_sweep_expires_each_row_once() {
    let h = Harness::new().await;
    let first = h.orchestrator.authorize(h.buy_request()).await.unwrap();
    let second = h.orchestrator.authorize(h.buy_request()).await.unwrap();

    assert_eq!(h.orchestrator.sweep_expired().await.unwrap(), 0);
    h.clock.advance_secs(400);
    assert_eq!(h.orchestrator.sweep_expired().await.unwrap(), 2);
    assert_eq!(h.orchestrator.sweep_expired().await.unwrap(), 0);

    for id in [&first.trade_authorization_id, &second.trade_authorization_id] {
        assert_eq!(h.status_of(id).await, "expired");
        assert_eq!(h.audit_actions(id).await, vec!["auth_created", "auth_expired"]);
    }
}

#[tokio::test]
async fn test_validation_errors_create_no_state() {
    let h = Harness::new().await;

    let mut zero = h.buy_request();
    zero.quantity = Decimal::ZERO;
    let mut limit_without_price = h.buy_request();
    limit_without_price.order_type = OrderType::Limit;
    let mut bad_symbol = h.buy_request();
    bad_symbol.symbol = "".into();

    for request in [zero, limit_without_price, bad_symbol] {
        assert!(matches!(
            h.orchestrator.authorize(request).await,
            Err(TradeAuthError::Validation(_))
        ));
    }
    assert!(h.persisted_text().await.is_empty());
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_inactive_or_foreign_connection_rejected() {
    let h = Harness::new().await;
    add_connection(&h.pool, "conn-revoked", USER, "revoked").await;
    add_connection(&h.pool, "conn-other", "user-2", "active").await;

    for connection in ["conn-revoked", "conn-other", "conn-missing"] {
        let mut request = h.buy_request();
        request.brokerage_connection_id = connection.into();
        assert!(matches!(
            h.orchestrator.authorize(request).await,
            Err(TradeAuthError::InvalidConnection)
        ));
    }
}

#[tokio::test]
async fn test_daily_trade_limit() {
    let h = Harness::new().await;
    h.risk
        .set_profile(
            USER,
            RiskProfile {
                daily_trade_limit: 2,
                ..RiskProfile::default()
            },
        )
        .await;

    h.orchestrator.authorize(h.buy_request()).await.unwrap();
    h.orchestrator.authorize(h.buy_request()).await.unwrap();
    assert!(matches!(
        h.orchestrator.authorize(h.buy_request()).await,
        Err(TradeAuthError::RiskLimitExceeded(_))
    ));

    // 24시간이 지나면 다시 가능
    h.clock.advance_secs(24 * 60 * 60 + 1);
    assert!(h.orchestrator.authorize(h.buy_request()).await.is_ok());
}

/// 동시 승인 요청도 일일 한도를 넘지 못함
#[tokio::test]
async fn test_daily_trade_limit_holds_under_concurrency() {
    let h = Harness::new().await;
    h.risk
        .set_profile(
            USER,
            RiskProfile {
                daily_trade_limit: 3,
                ..RiskProfile::default()
            },
        )
        .await;

    let attempts = (0..10).map(|_| {
        let orchestrator = h.orchestrator.clone();
        let request = h.buy_request();
        tokio::spawn(async move { orchestrator.authorize(request).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(err, TradeAuthError::RiskLimitExceeded(_)), "예상치 못한 오류: {:?}", err);
    }

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trade_authorizations")
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(rows, 3);
    // 거부된 요청은 임시 엔트리도 남기지 않음
    assert_eq!(h.store.len().await, 3);
}

#[tokio::test]
async fn test_position_size_limit() {
    let h = Harness::new().await;
    h.risk
        .set_profile(
            USER,
            RiskProfile {
                max_position_pct: dec!(25),
                daily_trade_limit: 20,
                portfolio_value: Some(dec!(1000)),
            },
        )
        .await;

    let mut too_big = h.buy_request();
    too_big.order_type = OrderType::Limit;
    too_big.limit_price = Some(dec!(30));
    assert!(matches!(
        h.orchestrator.authorize(too_big).await,
        Err(TradeAuthError::RiskLimitExceeded(_))
    ));

    let mut within = h.buy_request();
    within.order_type = OrderType::Limit;
    within.limit_price = Some(dec!(25));
    assert!(h.orchestrator.authorize(within).await.is_ok());
}

#[tokio::test]
async fn test_configured_ttl_is_used() {
    let config = AuthConfig {
        authorization_ttl: Duration::from_secs(60),
        ..AuthConfig::default()
    };
    let h = Harness::with_config(config, BrokerMode::Fill).await;
    let grant = h.orchestrator.authorize(h.buy_request()).await.unwrap();
    assert_eq!(grant.ttl_seconds, 60);

    h.clock.advance_secs(61);
    assert!(h
        .orchestrator
        .execute(USER, &grant.trade_authorization_id, &grant.token, None)
        .await
        .is_err());
    assert_eq!(h.status_of(&grant.trade_authorization_id).await, "expired");
}

#[tokio::test]
async fn test_maintenance_worker_runs_sweep_and_reconcile() {
    use std::sync::Arc;
    use trade_auth::trade_auth::MaintenanceWorker;

    let h = Harness::new().await;
    h.orchestrator.authorize(h.buy_request()).await.unwrap();
    h.clock.advance_secs(301);

    let worker = Arc::new(MaintenanceWorker::new(h.orchestrator.clone()));
    worker.run_once().await;

    let stats = worker.stats();
    assert_eq!(stats.runs, 1);
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.failures, 0);
}
