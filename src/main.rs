use std::env;
use std::path::PathBuf;

use anyhow::anyhow;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use acuity::{ServerConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Handle CLI arguments
    let mut config_path: Option<PathBuf> = None;
    let mut args = env::args();
    let _ = args.next();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config_path = Some(PathBuf::from(path));
            }
            other => {
                anyhow::bail!("Unknown argument '{other}'. Usage: acuity [--config <file.yaml>]");
            }
        }
    }

    // Load configuration
    let config = match &config_path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ServerConfig::from_file(path).map_err(|e| anyhow!(e.to_string()))?
        }
        None => ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?,
    };
    let address = config.address();
    info!("Starting server on {address}");

    // Create application state
    let app_state = AppState::new(config).await;
    let app = routes::create_app(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;

    info!("Server listening on {address}");

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
