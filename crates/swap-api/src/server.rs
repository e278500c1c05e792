//! Serving the swap API

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes::create_router;
use crate::AppState;

/// Routes plus request tracing and permissive CORS for browser wallets
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve on an already bound listener until the server fails
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(
        %addr,
        net_mode = %state.config().net_mode,
        staking = state.staking().is_some(),
        "Swap API listening"
    );
    axum::serve(listener, create_app(state)).await
}

/// Bind `api_host:api_port` from the app config and serve
pub async fn start_server(state: AppState) -> std::io::Result<()> {
    let addr: SocketAddr = state.config().api_addr();
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!(%addr, error = %e, "Cannot bind swap API");
        e
    })?;
    serve(listener, state).await
}
