use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;
use rematch_tracker::error::TrackerError;
use rematch_tracker::models::SnapshotResponse;

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    /// Game-mode filter to apply on the profile page
    pub mode: Option<String>,
}

/// Re-scrape a user's profile and return the new snapshot
pub async fn refresh_profile(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    query: web::Query<RefreshQuery>,
) -> Result<HttpResponse, TrackerError> {
    let user_id = path.into_inner();
    let snapshot = state
        .service
        .refresh(&user_id, query.mode.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(SnapshotResponse::from(snapshot)))
}

/// Last cached snapshot for a user
pub async fn get_profile(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, TrackerError> {
    let user_id = path.into_inner();

    let snapshot = state.service.cached(&user_id)?;

    Ok(HttpResponse::Ok().json(SnapshotResponse::from(snapshot)))
}
