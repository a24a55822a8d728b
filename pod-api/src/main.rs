use pod_api::{kube, server, AppState, Config};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(config.log_level.clone())
        .init();

    tracing::info!("Pod API starting");
    tracing::info!("Port: {}", config.port);
    tracing::info!(
        "Kube context: {}",
        config.kube_context.as_deref().unwrap_or("inferred")
    );
    tracing::info!("Default log tail: {} lines", config.log_tail_lines);

    // The cluster is dialed on the first request
    let connection = kube::KubeConnection::new(config.kube_context.clone());

    let state = AppState::new(
        Arc::new(connection) as Arc<dyn kube::Connection>,
        config.log_tail_lines,
    );

    // Build HTTP server
    let app = server::build_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Pod API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
