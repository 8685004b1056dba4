//! RPC server implementation.

use std::future::Future;
use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;

use crate::handlers::{self, AppState};
use crate::RpcError;

pub struct RpcServer {
    pub listen: SocketAddr,
    pub state: AppState,
}

impl RpcServer {
    pub fn new(listen: SocketAddr, state: AppState) -> Self {
        Self { listen, state }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.listen)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.listen)))?;
        let local = listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))?;
        tracing::info!(%local, "http server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;

        tracing::info!("http server stopped");
        Ok(())
    }
}

/// Routes for every discovery operation.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/get_current_block", get(handlers::get_current_block))
        .route(
            "/subscribe/:address",
            get(handlers::subscribe).post(handlers::subscribe),
        )
        .route("/get_transactions/:address", get(handlers::get_transactions))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}
