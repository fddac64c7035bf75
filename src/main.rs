use crate::deployment::DeploymentClient;
use crate::driver::{DEPLOYMENT_UPDATE_DRIVER, DeploymentUpdateDriver};
use crate::registry::DriverRegistry;
use std::env;
use std::sync::Arc;
use tracing::info;

mod config;
mod deployment;
mod driver;
mod endpoint;
mod error;
mod model;
mod payload;
mod registry;
mod tag;
#[cfg(test)]
mod test_support;
mod webserver;

#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    info!("Starting deployment-update-driver {}", env!("CARGO_PKG_VERSION"));

    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let config = config::load_config(&config_path)?;

    let http_client = deployment::create_client(&config)?;
    let mut registry = DriverRegistry::new();
    registry.register(
        DEPLOYMENT_UPDATE_DRIVER,
        Arc::new(DeploymentUpdateDriver::new(
            config.cattle_url.clone(),
            DeploymentClient::new(http_client),
        )),
    );

    let webhooks = registry.register_webhooks(&config.webhooks)?;
    info!("Serving {} webhooks", webhooks.len());

    let app = webserver::create_app(webserver::AppState::new(registry, webhooks));
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.webserver.port));
    info!("Starting webserver on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
