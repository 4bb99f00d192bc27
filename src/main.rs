use sdrelay::RelayConfig;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    sdrelay::logger::init()?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = RelayConfig::from_env();

    sdrelay::logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &config);
    sdrelay::logger::log_config_info(&config);

    if let Err(e) = sdrelay::server::run(config).await {
        log::error!("❌ Relay stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}
