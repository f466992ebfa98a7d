use std::sync::Arc;

use anyhow::Context;

use souk_api::app::{build_app, services::AppServices};
use souk_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    souk_observability::init();

    let config = ApiConfig::from_env()?;

    let services = if config.seed_demo {
        AppServices::demo().context("failed to seed demo catalog")?
    } else {
        AppServices::in_memory()
    };

    let app = build_app(config.jwt_secret, Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
