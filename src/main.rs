use microserve::config::Config;
use microserve::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let server = Server::bind(&cfg)?;

    server
        .run(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "Can't listen for shutdown signal"),
            }
        })
        .await
}
