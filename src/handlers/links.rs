use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;

use crate::AppState;
use rematch_tracker::error::TrackerError;
use rematch_tracker::models::LinkRequest;

/// Link a user to a tracker profile
///
/// `force` replaces an existing link; without it a linked user is refused.
pub async fn create_link(
    state: web::Data<Arc<AppState>>,
    req: web::Json<LinkRequest>,
) -> Result<HttpResponse, TrackerError> {
    let record = if req.force {
        state.service.force_link(&req.user_id, &req.profile_url)?
    } else {
        state.service.link(&req.user_id, &req.profile_url)?
    };

    Ok(HttpResponse::Created().json(record))
}

/// List all links with display names
pub async fn list_links(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, TrackerError> {
    Ok(HttpResponse::Ok().json(state.service.list_links()?))
}

/// Remove one user's link
pub async fn delete_link(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, TrackerError> {
    let user_id = path.into_inner();
    let removed = state.service.unlink(&user_id)?;

    Ok(HttpResponse::Ok().json(json!({ "user_id": user_id, "removed": removed })))
}

/// Remove every link
pub async fn clear_links(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, TrackerError> {
    state.service.clear_links()?;
    Ok(HttpResponse::NoContent().finish())
}
