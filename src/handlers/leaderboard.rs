use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;
use rematch_tracker::core::DEFAULT_PAGE_SIZE;
use rematch_tracker::error::TrackerError;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// Leaderboard page for a stat
pub async fn get_leaderboard(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, TrackerError> {
    let stat = path.into_inner();
    let page = state.service.leaderboard(
        &stat,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(DEFAULT_PAGE_SIZE),
    )?;

    Ok(HttpResponse::Ok().json(page))
}
