mod api;
mod app_config;
mod auth;
mod error;
mod metrics;
mod router;
mod startup;
mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let config = app_config::load_config();
    config.log_summary();

    let client = app_config::build_client(&config)?;
    let addr = config.service.bind_address();
    let state = startup::build_app_state(config, client)?;
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
