use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use weekly_tracker::{AppState, Config, load_data, router, storage, template::Template};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    storage::ensure_parent_dir(&config.data_path).await?;

    let data = load_data(&config.data_path).await?;
    let template = Template::from_config(config.template_path.as_deref())?;
    let state = AppState::new(config.data_path.clone(), data, template);
    let app = router(state);

    let addr = config.addr();
    info!("listening on http://{addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
