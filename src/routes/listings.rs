use actix_web::{web, HttpResponse};
use serde_json::{json, Map, Value};
use validator::Validate;

use super::AppState;
use crate::error::ApiError;
use crate::models::{ListingDraft, ListingKind};

const KIND_SEGMENT: &str = "{kind:scholarships|internships|competitions}";

/// Configure listing CRUD for every listing kind
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(format!("/{}", KIND_SEGMENT))
            .route(web::get().to(list))
            .route(web::post().to(create)),
    )
    .service(
        web::resource(format!("/{}/{{id}}", KIND_SEGMENT))
            .route(web::get().to(get))
            .route(web::put().to(update))
            .route(web::delete().to(delete)),
    );
}

fn kind_of(segment: &str) -> Result<ListingKind, ApiError> {
    ListingKind::from_table(segment).ok_or_else(|| ApiError::not_found("Not found"))
}

fn keyed(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// GET /api/{kind}
async fn list(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let kind = kind_of(&path)?;
    let listings = state.catalog.listings(kind).await?;

    let items: Vec<Value> = listings.iter().map(|l| l.to_json(kind)).collect();
    Ok(HttpResponse::Ok().json(keyed(kind.table(), Value::Array(items))))
}

/// GET /api/{kind}/{id}
async fn get(state: web::Data<AppState>, path: web::Path<(String, i64)>) -> Result<HttpResponse, ApiError> {
    let (segment, id) = path.into_inner();
    let kind = kind_of(&segment)?;

    let listing = state
        .postgres
        .get_listing(kind, id)
        .await?
        .ok_or_else(|| ApiError::not_found("not found"))?;

    Ok(HttpResponse::Ok().json(keyed(kind.singular(), listing.to_json(kind))))
}

/// POST /api/{kind}
async fn create(
    state: web::Data<AppState>,
    path: web::Path<String>,
    draft: web::Json<ListingDraft>,
) -> Result<HttpResponse, ApiError> {
    let kind = kind_of(&path)?;
    draft.validate().map_err(|e| ApiError::from_validation(&e))?;

    let listing = state.postgres.create_listing(kind, &draft).await?;
    state.catalog.invalidate(kind).await;
    tracing::info!("Created {} {}", kind.singular(), listing.id);

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "id": listing.id })))
}

/// PUT /api/{kind}/{id}
async fn update(
    state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
    draft: web::Json<ListingDraft>,
) -> Result<HttpResponse, ApiError> {
    let (segment, id) = path.into_inner();
    let kind = kind_of(&segment)?;
    draft.validate().map_err(|e| ApiError::from_validation(&e))?;

    state
        .postgres
        .update_listing(kind, id, &draft)
        .await?
        .ok_or_else(|| ApiError::not_found("not found"))?;
    state.catalog.invalidate(kind).await;

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// DELETE /api/{kind}/{id}
async fn delete(state: web::Data<AppState>, path: web::Path<(String, i64)>) -> Result<HttpResponse, ApiError> {
    let (segment, id) = path.into_inner();
    let kind = kind_of(&segment)?;

    if state.postgres.delete_listing(kind, id).await? {
        state.catalog.invalidate(kind).await;
        tracing::info!("Deleted {} {}", kind.singular(), id);
    }

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}
