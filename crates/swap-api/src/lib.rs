//! swap-api: HTTP API layer for the swap workspace
//!
//! Exposes bridge pairs and fees, staking figures and instant-trade quotes
//! to the frontend, plus the wallet sign-in session.

pub mod dto;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;

pub use server::*;
pub use session::{SessionService, SessionUser};
pub use state::AppState;
