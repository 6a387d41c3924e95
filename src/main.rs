use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rematch_tracker::{AppConfig, TrackerService};

mod handlers;

use handlers::{health, leaderboard, links, profiles};

/// Application state shared across handlers
pub struct AppState {
    pub service: TrackerService,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set subscriber: {}", e);
    }

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let addr = config.addr();

    info!("Opening data directory {:?}", config.storage.data_dir);

    let service = TrackerService::from_config(&config).map_err(|e| {
        error!("Failed to start tracker service: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let app_state = Arc::new(AppState { service });

    info!("Starting Rematch tracker API at http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health::health_check))
            .route("/links", web::post().to(links::create_link))
            .route("/links", web::get().to(links::list_links))
            .route("/links", web::delete().to(links::clear_links))
            .route("/links/{user_id}", web::delete().to(links::delete_link))
            .route(
                "/profiles/{user_id}/refresh",
                web::post().to(profiles::refresh_profile),
            )
            .route("/profiles/{user_id}", web::get().to(profiles::get_profile))
            .route("/leaderboard/{stat}", web::get().to(leaderboard::get_leaderboard))
    })
    .bind(&addr)?
    .run()
    .await
}
