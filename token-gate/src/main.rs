use anyhow::Context;
use common_token_auth::init_global;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use token_gate::{build_router, AppState, GateConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GateConfig::from_env()?;
    let verifier = init_global(config.verifier.clone())
        .context("failed to initialise token verifier")?
        .clone();
    info!(key_url = %verifier.key_endpoint(), "token verifier initialised");

    let app = build_router(AppState::new(verifier));

    let addr = config.socket_addr()?;
    info!(%addr, "starting token-gate");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
