//! gRPC adapter: the `flagd.v1.FeatureService` served by tonic.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::AppState;

mod feature_server;

pub use feature_server::FeatureRpc;

#[allow(clippy::all, clippy::pedantic, clippy::nursery)]
pub mod pb {
    tonic::include_proto!("flagd.v1");
}

pub use pb::feature_service_server::FeatureServiceServer;

/// Serves the RPC listener until `shutdown` resolves.
pub async fn serve<F>(state: Arc<AppState>, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let service = FeatureServiceServer::new(FeatureRpc::from_state(&state));

    info!("gRPC server listening on {addr}");

    tonic::transport::Server::builder()
        .timeout(timeout)
        .add_service(service)
        .serve_with_shutdown(addr, shutdown)
        .await?;

    Ok(())
}
