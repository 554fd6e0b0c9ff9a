use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tempest_dashboard::common::AppState;
use tempest_dashboard::config::Config;
use tempest_dashboard::plugins::PluginHost;
use tempest_dashboard::render::terminal::TerminalRenderer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tempest_dashboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting tempest-dashboard...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(
        server = %config.server_url,
        units = %config.default_units,
        range = %config.default_range,
        poll_secs = config.poll_interval_seconds,
        "Configuration loaded"
    );

    let state = AppState::new(config)?;
    let coordinator = state.coordinator();

    let plugins = match state.load_plugins() {
        Ok(host) => Arc::new(host),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring plugin manifest");
            Arc::new(PluginHost::empty())
        }
    };
    if !plugins.is_empty() {
        tracing::info!(plugins = ?plugins.names(), "Plugins loaded");
        coordinator.attach_plugins(Arc::clone(&plugins));
    }

    let renderer = TerminalRenderer::attach(
        &state.session,
        std::io::stdout(),
        Some(Arc::clone(&plugins)),
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    // Reachability first; failures only degrade the status, the loop keeps retrying
    match coordinator.check_health().await {
        Ok(health) => tracing::info!(
            version = %health.version,
            stations = health.stations.len(),
            "tempestd reachable"
        ),
        Err(e) => tracing::warn!(error = %e, "tempestd unreachable, retrying"),
    }

    // Station list, retried on the poll interval until one is selected
    let mut retry = tokio::time::interval(state.config.poll_interval());
    loop {
        tokio::select! {
            () = &mut shutdown => {
                plugins.destroy_all();
                renderer.detach();
                return Ok(());
            }
            _ = retry.tick() => {
                match coordinator.load_stations(state.config.station_id).await {
                    Ok(Some(_)) => break,
                    Ok(None) => tracing::warn!("tempestd reports no stations"),
                    Err(_) => {}
                }
            }
        }
    }

    // Spawn the refresh loop (runs until shutdown)
    let runner = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.run().await }
    });

    shutdown.await;
    coordinator.shutdown();
    if let Err(e) = runner.await {
        tracing::error!(error = %e, "Refresh loop terminated abnormally");
    }

    plugins.destroy_all();
    renderer.detach();
    tracing::info!("Dashboard shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
