use actix_web::{web, HttpResponse};
use serde_json::json;

use super::{AppState, AuthUser};
use crate::error::ApiError;
use crate::models::MarkReadRequest;

/// Configure notification inbox routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list))
            .route("/unread-count", web::get().to(unread_count))
            .route("/mark-all-read", web::patch().to(mark_all_read))
            .route("/mark-read", web::post().to(mark_read_legacy))
            .route("/{id}/read", web::patch().to(mark_read))
            .route("/{id}", web::delete().to(delete)),
    );
}

/// GET /api/notifications
async fn list(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let notifications = state.postgres.list_notifications(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "notifications": notifications })))
}

/// GET /api/notifications/unread-count
async fn unread_count(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let count = state.postgres.unread_count(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

/// PATCH /api/notifications/{id}/read
async fn mark_read(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    state.postgres.mark_notification_read(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// PATCH /api/notifications/mark-all-read
async fn mark_all_read(user: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let updated = state.postgres.mark_all_notifications_read(user.id).await?;
    tracing::debug!("Marked {} notifications read for user {}", updated, user.id);

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// DELETE /api/notifications/{id}
async fn delete(user: AuthUser, state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    state.postgres.delete_notification(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// POST /api/notifications/mark-read, kept for older clients
async fn mark_read_legacy(
    user: AuthUser,
    state: web::Data<AppState>,
    req: web::Json<MarkReadRequest>,
) -> Result<HttpResponse, ApiError> {
    state.postgres.mark_notification_read(user.id, req.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}
