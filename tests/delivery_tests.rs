/// End-to-end delivery tests for the real-time notification channel
///
/// This test module covers:
/// - Dispatch through the real connection registry
/// - Wire format of the pushed envelope
/// - HTTP ingress behavior (always-accepted, outcome reporting)
/// - Registry lifecycle across connect/disconnect
use std::sync::Arc;

use actix_web::{test, web, App};
use jsonwebtoken::{encode, EncodingKey, Header};
use notification_service::auth::TokenClaims;
use notification_service::config::{AppConfig, AuthConfig, Config};
use notification_service::handlers::websocket::ws_connect;
use notification_service::handlers::{register_notifications, register_websocket};
use notification_service::models::{Notification, NotificationType};
use notification_service::websocket::{ConnectionId, Envelope, RECEIVE_NOTIFICATION};
use notification_service::{AppState, ConnectionRegistry, DeliveryOutcome, NotificationDispatcher};
use serde_json::json;

fn test_config() -> Config {
    Config {
        app: AppConfig {
            env: "test".to_string(),
            port: 0,
        },
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
        },
    }
}

#[tokio::test]
async fn test_dispatch_through_registry_delivers_envelope() {
    let registry = ConnectionRegistry::new();
    let dispatcher = NotificationDispatcher::new(Arc::new(registry.clone()));

    let mut rx = registry.register("u1", ConnectionId::new()).await;

    let notification = Notification::new(
        NotificationType::ProposalAccepted,
        "u1",
        "Your proposal was accepted",
        Some("proposal-9".to_string()),
    );

    let outcome = dispatcher.dispatch("u1", &notification).await;
    assert_eq!(outcome, DeliveryOutcome::Delivered);

    let frame = rx.recv().await.expect("connection should receive a frame");
    let envelope = Envelope::from_json(&frame).unwrap();
    assert_eq!(envelope.event, RECEIVE_NOTIFICATION);

    let pushed: Notification = serde_json::from_value(envelope.data).unwrap();
    assert_eq!(pushed, notification);
}

#[tokio::test]
async fn test_dispatch_to_offline_user_still_delivered_outcome() {
    // No registered connection: the transport accepts the send and drops it.
    let registry = ConnectionRegistry::new();
    let dispatcher = NotificationDispatcher::new(Arc::new(registry));

    let notification = Notification::new(NotificationType::Message, "offline", "hi", None);
    let outcome = dispatcher.dispatch("offline", &notification).await;
    assert_eq!(outcome, DeliveryOutcome::Delivered);
}

#[tokio::test]
async fn test_dispatch_fans_out_to_every_connection_of_user() {
    let registry = ConnectionRegistry::new();
    let dispatcher = NotificationDispatcher::new(Arc::new(registry.clone()));

    let mut rx1 = registry.register("u1", ConnectionId::new()).await;
    let mut rx2 = registry.register("u1", ConnectionId::new()).await;

    let notification = Notification::new(NotificationType::PaymentCompleted, "u1", "paid", None);
    dispatcher.dispatch("u1", &notification).await;

    assert!(rx1.recv().await.is_some());
    assert!(rx2.recv().await.is_some());
}

#[tokio::test]
async fn test_disconnected_handle_no_longer_receives() {
    let registry = ConnectionRegistry::new();
    let dispatcher = NotificationDispatcher::new(Arc::new(registry.clone()));

    let gone = ConnectionId::new();
    let mut rx_gone = registry.register("u1", gone).await;
    let mut rx_live = registry.register("u1", ConnectionId::new()).await;

    registry.deregister("u1", gone).await;

    let notification = Notification::new(NotificationType::System, "u1", "maintenance", None);
    dispatcher.dispatch("u1", &notification).await;

    assert!(rx_live.recv().await.is_some());
    assert!(rx_gone.try_recv().is_err());
}

#[actix_web::test]
async fn test_ingress_accepts_and_reports_outcome() {
    let state = AppState::new(test_config());
    let mut rx = state.registry.register("u1", ConnectionId::new()).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| {
                register_notifications(cfg);
                register_websocket(cfg);
            }),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/notifications")
        .set_json(json!({
            "recipient_id": "u1",
            "notification_type": "PROPOSAL_ACCEPTED",
            "content": "Your proposal was accepted",
            "reference_id": "proposal-3"
        }))
        .to_request();

    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["outcome"], "delivered");
    assert_eq!(resp["active_connections"], 1);

    let frame = rx.recv().await.unwrap();
    let envelope = Envelope::from_json(&frame).unwrap();
    assert_eq!(envelope.event, RECEIVE_NOTIFICATION);
    assert_eq!(envelope.data["recipient_id"], "u1");
    assert_eq!(envelope.data["reference_id"], "proposal-3");
}

#[actix_web::test]
async fn test_ingress_blank_recipient_still_accepted() {
    let state = AppState::new(test_config());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(register_notifications),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/notifications")
        .set_json(json!({
            "recipient_id": "",
            "notification_type": "SYSTEM",
            "content": "x"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::ACCEPTED);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["outcome"], "skipped_invalid_recipient");
    assert_eq!(body["active_connections"], 0);
}

#[actix_web::test]
async fn test_ws_status_endpoint() {
    let state = AppState::new(test_config());
    let _rx = state.registry.register("u7", ConnectionId::new()).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(register_websocket),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/ws/status/u7")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["connected"], true);
    assert_eq!(body["connection_count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/ws/status/nobody")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["connected"], false);
}

#[actix_web::test]
async fn test_ws_stats_endpoint() {
    let state = AppState::new(test_config());
    let _a = state.registry.register("u1", ConnectionId::new()).await;
    let _b = state.registry.register("u1", ConnectionId::new()).await;
    let _c = state.registry.register("u2", ConnectionId::new()).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(register_websocket),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/ws/stats").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total_connections"], 3);
    assert_eq!(body["connected_users"], 2);

    let mut users: Vec<String> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    users.sort();
    assert_eq!(users, vec!["u1".to_string(), "u2".to_string()]);
}

fn sign_token(claims: &TokenClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn anonymous_claims() -> TokenClaims {
    TokenClaims {
        nameid: None,
        sub: None,
        user_id: None,
        name_identifier: None,
        exp: chrono::Utc::now().timestamp() + 3600,
    }
}

#[actix_web::test]
async fn test_ws_connect_without_token_is_rejected() {
    let state = AppState::new(test_config());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/ws", web::get().to(ws_connect)),
    )
    .await;

    let req = test::TestRequest::get().uri("/ws").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    assert_eq!(state.registry.total_connections().await, 0);
}

#[actix_web::test]
async fn test_ws_connect_bad_signature_is_rejected() {
    let state = AppState::new(test_config());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/ws", web::get().to(ws_connect)),
    )
    .await;

    let mut claims = anonymous_claims();
    claims.sub = Some("u1".to_string());
    let token = sign_token(&claims, "not-the-service-secret");

    let req = test::TestRequest::get()
        .uri(&format!("/ws?token={}", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    assert_eq!(state.registry.total_connections().await, 0);
}

#[actix_web::test]
async fn test_ws_connect_unresolvable_identity_never_registered() {
    // Valid signature but no identity claim at all: the connection must be
    // rejected without ever entering the registry.
    let state = AppState::new(test_config());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/ws", web::get().to(ws_connect)),
    )
    .await;

    let token = sign_token(&anonymous_claims(), "test-secret");

    let req = test::TestRequest::get()
        .uri(&format!("/ws?token={}", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    assert_eq!(state.registry.total_connections().await, 0);
    assert_eq!(state.registry.connected_users().await, 0);
}

#[actix_web::test]
async fn test_ws_connect_empty_identity_claims_never_registered() {
    // Empty claim values must be excluded, not defaulted to a sentinel key.
    let state = AppState::new(test_config());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/ws", web::get().to(ws_connect)),
    )
    .await;

    let mut claims = anonymous_claims();
    claims.sub = Some(String::new());
    claims.user_id = Some(String::new());
    let token = sign_token(&claims, "test-secret");

    let req = test::TestRequest::get()
        .uri(&format!("/ws?token={}", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    assert_eq!(state.registry.connected_user_ids().await, Vec::<String>::new());
}
