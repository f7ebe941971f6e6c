use meshpreview_server::{config::ServiceConfig, server::PreviewServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::from_env()?;
    let server = PreviewServer::new(config)?;
    server.run().await?;

    Ok(())
}
