use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use evac_store::{spawn_replication_loop, CloudReplicator, StoreClient};
use tokio::signal;
use tracing::{error, info, instrument};

use crate::config::PipelineConfig;
use crate::dispatch::establish_uplink;
use crate::scheduler::run_scheduler;
use crate::state::AppState;

/// Composition root: wires the store, the shared application state, the
/// capture scheduler, the cloud replicator and the websocket transport,
/// then owns the process until a shutdown signal arrives.
pub struct OrchestratorKernel {
    listening_port: u16,
    state: AppState,
}

impl OrchestratorKernel {
    #[instrument(skip(database_access_token))]
    pub async fn ignite(database_connection_url: &str, database_access_token: Option<String>, listening_port: u16) -> Self {
        let store = StoreClient::connect(database_connection_url, database_access_token)
            .await
            .expect("database link failed; ignition aborted");

        let config = PipelineConfig::from_env();
        let state = AppState::new(store, config).await;

        OrchestratorKernel { listening_port, state }
    }

    pub async fn launch(self) {
        let replicator = Arc::new(CloudReplicator::new(
            self.state.http.clone(),
            self.state.config.cloud_storage_endpoint.clone(),
            self.state.floors.clone(),
            self.state.images.clone(),
            self.state.routes.clone(),
            self.state.settings.clone(),
        ));
        let replication_handle = spawn_replication_loop(replicator);

        let scheduler_state = self.state.clone();
        let scheduler_handle = tokio::spawn(run_scheduler(scheduler_state));

        let router = Router::new().route("/ws", get(establish_uplink)).with_state(self.state.clone());

        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.listening_port);
        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("failed to bind listening port");

        info!(%bind_address, "listening");

        let shutdown_state = self.state.clone();
        let server = axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown_signal());

        if let Err(e) = server.await {
            error!(error = %e, "http server exited with error");
        }

        // §5/§9: stop the ticker, let dispatch subscribers disconnect on
        // their own, close the replicator, wait up to 30s for whatever is
        // mid-flight (an in-flight radio transmission keeps the existing
        // 30s kill timer rather than being force-killed on shutdown).
        shutdown_state.begin_shutdown();
        scheduler_handle.abort();
        replication_handle.abort();

        tokio::time::sleep(Duration::from_secs(1)).await;
        info!("shutdown complete");
    }
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
