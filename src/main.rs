use signalpilot::application::bootstrap;
use signalpilot::config::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    info!("starting SignalPilot");

    let config = Config::from_env()?;
    let app = bootstrap::build(config).await?;

    if let Err(err) = app.startup().await {
        error!(%err, "startup failed");
        return Err(err);
    }
    app.recover().await?;
    app.run_scheduler();

    tokio::signal::ctrl_c().await?;
    info!("ctrl-c received, shutting down");
    app.shutdown().await?;

    Ok(())
}
