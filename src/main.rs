use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use product_review_assistant::core::config::AppPaths;
use product_review_assistant::core::logging;
use product_review_assistant::server;
use product_review_assistant::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let paths = Arc::new(AppPaths::new());
    paths
        .ensure_dirs()
        .with_context(|| format!("Failed to create {}", paths.user_data_dir.display()))?;
    logging::init(&paths.log_dir, "server")?;

    let state = AppState::initialize(paths).await?;
    tracing::debug!(
        config = %state.config.redact_sensitive_values(&state.config.load_config()?),
        "effective configuration"
    );

    spawn_session_sweeper(state.clone());

    let bind_addr = format!("{}:{}", state.settings.server.host, state.settings.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}

fn spawn_session_sweeper(state: Arc<AppState>) {
    let period = Duration::from_secs(state.settings.sessions.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = state.sessions.purge_expired();
            if purged > 0 {
                tracing::info!(purged, remaining = state.sessions.len(), "purged idle sessions");
            }
        }
    });
}
