use std::sync::Arc;

use tokio::signal;
use tracing::info;

use postgres_cluster_api::controller::{Context, KubeControlPlane};
use postgres_cluster_api::health::HealthState;
use postgres_cluster_api::{Config, build_router, run_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install the TLS crypto provider before the kube client is built
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
        && rustls::crypto::CryptoProvider::get_default().is_none()
    {
        return Err("Failed to install rustls crypto provider and no provider is available".into());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("postgres_cluster_api=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .init();

    let config = Config::from_env();
    info!(
        port = config.port,
        namespace = %config.namespace,
        manage_credentials = config.manage_credentials,
        "Starting postgres-cluster-api"
    );

    let health_state = Arc::new(HealthState::new());

    // The client connects on first request; missing credentials fail per request
    let control_plane = KubeControlPlane::new(config.namespace.clone());
    let ctx = Arc::new(Context::new(
        control_plane,
        &config,
        Some(health_state.clone()),
    ));

    let router = build_router(ctx, health_state.clone());

    health_state.set_ready(true).await;

    let shutdown = {
        let health_state = health_state.clone();
        async move {
            shutdown_signal().await;
            info!("Received shutdown signal, draining in-flight requests");
            health_state.set_ready(false).await;
        }
    };

    run_server(config.port, router, shutdown).await?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
