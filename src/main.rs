use anyhow::Result;
use s3manager_client::{
    config::AppConfig,
    handlers::{self, HandlerContext},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup (stderr keeps stdout clean for tables and downloads) ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // --- Parse config + command ---
    let (cfg, command) = AppConfig::from_env_and_args()?;
    tracing::debug!("Starting s3manager with config: {:?}", cfg);

    // --- Initialize client ---
    let ctx = HandlerContext::new(cfg)?;

    // --- Run ---
    let mut stdout = std::io::stdout();
    handlers::dispatch(&ctx, command, &mut stdout).await
}
