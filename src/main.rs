use bwee_home::app_config::AppConfig;
use bwee_home::bwee::{ApiClient, EventChannel, acquire_credential, discover, verify_credential};
use bwee_home::domain::LogHost;
use bwee_home::engine::SyncEngine;
use std::error::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load()?;
    info!("✅  Loaded configuration");

    let ip_address = match config.gateway().ip_address() {
        Some(ip_address) => ip_address.to_string(),
        None => {
            let response = discover(config.discovery()).await?;
            response.data.and_then(|data| data.ip).ok_or("discovered gateway did not report its address")?
        }
    };
    config.gateway_mut().set_ip_address(ip_address.clone());
    info!("✅  Using gateway at {}", ip_address);

    if config.gateway().api_key().is_none() {
        let client = ApiClient::new(config.gateway());
        let api_key = acquire_credential(&client, &ip_address, config.gateway().port()).await?;
        info!("🔑 Paired, set gateway.api_key in config_local.toml to skip pairing on the next start");
        config.gateway_mut().set_api_key(api_key);
    }

    let client = ApiClient::new(config.gateway());
    let gateway = verify_credential(&client).await?;
    info!(
        "✅  Connected to {} ({}), firmware {}",
        gateway.name.as_deref().unwrap_or_default(),
        gateway.mac.as_deref().unwrap_or_default(),
        gateway.version.as_deref().unwrap_or_default()
    );

    let events = EventChannel::new(&ip_address, config.mqtt());
    let mut engine = SyncEngine::new(client, LogHost, events, &config);
    engine.start().await;
    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));

    engine
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("❌ Could not listen for shutdown signal: {}", e);
            }
        })
        .await;

    Ok(())
}
