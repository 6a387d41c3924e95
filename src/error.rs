use thiserror::Error;

use crate::scraper::ScraperError;
use crate::store::StoreError;

/// Errors surfaced to whoever issued the request
///
/// Messages are written to be relayed to the user verbatim.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// No link for the requesting user
    #[error("No linked profile for this user. Link a Rematch Tracker profile URL first.")]
    LinkNotFound { user_id: String },

    /// Self-service link attempted while already linked
    #[error("This user has already linked a profile. Contact an admin to relink.")]
    AlreadyLinked { user_id: String },

    /// Linked or not, the user has never been refreshed
    #[error("No cached profile for {user_id}. Refresh it first.")]
    SnapshotNotFound { user_id: String },

    #[error("Not a Rematch Tracker profile URL: {0}")]
    InvalidProfileUrl(String),

    #[error("Unsupported stat '{stat}'. Choose one of: {supported}")]
    UnsupportedStat { stat: String, supported: String },

    /// Upstream page unreachable or did not render in time
    #[error("Could not fetch the profile right now, try again later ({0})")]
    Acquisition(String),

    #[error("Storage error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ScraperError> for TrackerError {
    fn from(err: ScraperError) -> Self {
        match err {
            ScraperError::Acquisition(msg) => TrackerError::Acquisition(msg),
            ScraperError::InvalidProfileUrl(url) => TrackerError::InvalidProfileUrl(url),
            ScraperError::InvalidSelector(msg) => TrackerError::Config(msg),
        }
    }
}

impl TrackerError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            TrackerError::LinkNotFound { .. } => "link_not_found",
            TrackerError::AlreadyLinked { .. } => "already_linked",
            TrackerError::SnapshotNotFound { .. } => "snapshot_not_found",
            TrackerError::InvalidProfileUrl(_) => "invalid_profile_url",
            TrackerError::UnsupportedStat { .. } => "unsupported_stat",
            TrackerError::Acquisition(_) => "acquisition_error",
            TrackerError::Persistence(_) => "persistence_error",
            TrackerError::Config(_) => "config_error",
        }
    }
}

#[cfg(feature = "api")]
mod response {
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};

    use super::TrackerError;
    use crate::models::ErrorResponse;

    impl ResponseError for TrackerError {
        fn status_code(&self) -> StatusCode {
            match self {
                TrackerError::LinkNotFound { .. } => StatusCode::NOT_FOUND,
                TrackerError::SnapshotNotFound { .. } => StatusCode::NOT_FOUND,
                TrackerError::AlreadyLinked { .. } => StatusCode::CONFLICT,
                TrackerError::InvalidProfileUrl(_) => StatusCode::BAD_REQUEST,
                TrackerError::UnsupportedStat { .. } => StatusCode::BAD_REQUEST,
                TrackerError::Acquisition(_) => StatusCode::BAD_GATEWAY,
                TrackerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                TrackerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }

        fn error_response(&self) -> HttpResponse {
            HttpResponse::build(self.status_code()).json(ErrorResponse {
                error: self.code().to_string(),
                message: self.to_string(),
            })
        }
    }
}
