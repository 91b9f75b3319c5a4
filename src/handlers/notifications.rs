/// HTTP ingress for domain events.
///
/// Upstream services (proposal acceptance, payment completion, ...) POST the
/// notification here; the dispatcher attempts real-time delivery. The
/// response is always 202: the push channel is a convenience layered on data
/// the caller persists independently, so delivery is optional by contract.
use actix_web::{web, HttpResponse, Result as ActixResult};
use serde_json::json;

use crate::models::{CreateNotificationRequest, Notification};
use crate::state::AppState;

/// Create and dispatch a notification
///
/// Endpoint: POST /api/v1/notifications
pub async fn create_notification(
    state: web::Data<AppState>,
    body: web::Json<CreateNotificationRequest>,
) -> ActixResult<HttpResponse> {
    let req = body.into_inner();

    let notification = Notification::new(
        req.notification_type,
        req.recipient_id.clone(),
        req.content,
        req.reference_id,
    );

    let outcome = state
        .dispatcher
        .dispatch(&req.recipient_id, &notification)
        .await;
    let active_connections = state.registry.connection_count(&req.recipient_id).await;

    Ok(HttpResponse::Accepted().json(json!({
        "notification_id": notification.id,
        "outcome": outcome.as_str(),
        "active_connections": active_connections,
    })))
}

/// Register notification routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/notifications").route("", web::post().to(create_notification)),
    );
}
