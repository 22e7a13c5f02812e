use super::AppContext;
use crate::output::Output;
use crate::server::{router, AppState};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;
use tracing::{info, warn};
use watchtrack_core::RefreshPolicy;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(operation = "server_shutdown", "Shutdown signal received");
}

/// Serve until SIGINT/SIGTERM. Missing configuration does not stop the
/// server; the cron endpoint reports it as a server error instead.
pub async fn run_serve(ctx: &AppContext, bind: Option<String>, output: &Output) -> Result<()> {
    let credentials = ctx.credentials()?;
    let refresher = match ctx.refresher() {
        Ok(refresher) => Some(Arc::new(refresher)),
        Err(e) => {
            warn!(error = %e, "Refresher unavailable, the cron endpoint will return 500");
            None
        }
    };
    let cron_secret = credentials.cron_secret().map(Arc::from);
    if cron_secret.is_none() {
        warn!("No cron_secret configured, the cron endpoint will return 500");
    }

    let state = AppState {
        refresher,
        cron_secret,
        policy: RefreshPolicy::bounded(&ctx.config.refresh),
    };

    let bind = bind.unwrap_or_else(|| ctx.config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| eyre!("Failed to bind {}: {}", bind, e))?;
    info!(operation = "server_start", bind = %bind, "Listening");
    output.success(format!("Listening on {}", bind));

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| eyre!("Server failed: {}", e))?;
    Ok(())
}
