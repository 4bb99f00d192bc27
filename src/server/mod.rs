pub mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};

use crate::{
    backend::HttpBackend,
    config::RelayConfig,
    error::{RelayError, Result},
    relay::ImageRelay,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/generate", web::post().to(handlers::generate))
        .route("/presets", web::get().to(handlers::presets))
        .route("/health", web::get().to(handlers::health));
}

/// Binds the relay and serves until shutdown.
pub async fn run(config: RelayConfig) -> Result<()> {
    let backend = Arc::new(HttpBackend::from_config(&config)?);
    let bind_addr = config.bind_addr();
    let relay = web::Data::new(ImageRelay::new(config, backend));
    log::info!("🔗 Forwarding generations to {}", relay.backend_endpoint());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::new("%r -> %s in %Dms"))
            .app_data(relay.clone())
            .configure(configure)
    })
    .bind(bind_addr.clone())
    .map_err(|e| {
        RelayError::Config(format!(
            "failed to bind {}:{}: {}",
            bind_addr.0, bind_addr.1, e
        ))
    })?;

    server
        .run()
        .await
        .map_err(|e| RelayError::Internal(e.to_string()))
}
