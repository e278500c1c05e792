//! API route handlers

pub mod bridge;
pub mod health;
pub mod session;
pub mod staking;
pub mod swap;

use axum::{routing::get, Router};

use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/session", get(session::get_user))
        .nest("/bridge", bridge::router())
        .nest("/staking", staking::router())
        .nest("/swap", swap::router())
        .with_state(state)
}
