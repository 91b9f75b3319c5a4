/// WebSocket endpoints: the upgrade itself plus connection observability.
///
/// Upgrade flow: validate the bearer token, resolve the claim set to a user
/// id, register the connection, then hand the socket to the session actor. A
/// connection whose claims yield no identifier is rejected here and never
/// enters the registry.
use actix_web::{web, Error, HttpRequest, HttpResponse, Result as ActixResult};
use actix_web_actors::ws;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{bearer_token, decode_bearer, resolve_for_connection};
use crate::state::AppState;
use crate::websocket::{ConnectionId, WsSession};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// WebSocket upgrade
///
/// Endpoint: GET /ws
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsParams>,
) -> Result<HttpResponse, Error> {
    let params = query.into_inner();

    let Some(token) = bearer_token(&req, params.token.as_deref()) else {
        tracing::warn!("WebSocket connection rejected: no bearer token");
        return Ok(HttpResponse::Unauthorized().finish());
    };

    let claims = match decode_bearer(&token, &state.config.auth.jwt_secret) {
        Ok(claims) => claims,
        Err(_) => return Ok(HttpResponse::Unauthorized().finish()),
    };

    let connection_id = ConnectionId::new();
    let Some(user_id) = resolve_for_connection(connection_id, &claims) else {
        // no resolvable identifier: close without ever touching the registry
        return Ok(HttpResponse::Unauthorized().finish());
    };

    let rx = state.registry.register(&user_id, connection_id).await;
    let session = WsSession::new(user_id, connection_id, state.registry.clone(), rx);

    ws::start(session, &req, stream)
}

/// Connection status for one user
///
/// Endpoint: GET /api/v1/ws/status/{user_id}
pub async fn ws_status(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let user_id = path.into_inner();
    let connection_count = state.registry.connection_count(&user_id).await;

    Ok(HttpResponse::Ok().json(json!({
        "user_id": user_id,
        "connected": connection_count > 0,
        "connection_count": connection_count
    })))
}

/// Aggregate connection stats
///
/// Endpoint: GET /api/v1/ws/stats
pub async fn ws_stats(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let total_connections = state.registry.total_connections().await;
    let connected_users = state.registry.connected_users().await;
    let users = state.registry.connected_user_ids().await;

    Ok(HttpResponse::Ok().json(json!({
        "total_connections": total_connections,
        "connected_users": connected_users,
        "users": users,
    })))
}

/// Register WebSocket observability routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/ws")
            .route("/status/{user_id}", web::get().to(ws_status))
            .route("/stats", web::get().to(ws_stats)),
    );
}
