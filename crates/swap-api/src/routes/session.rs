//! Session endpoint

use axum::{extract::State, Json};

use crate::dto::{ApiError, ApiFailure};
use crate::session::SessionUser;
use crate::AppState;

/// GET /session - Current sign-in state
pub async fn get_user(State(state): State<AppState>) -> Result<Json<SessionUser>, ApiFailure> {
    let session = state
        .session()
        .ok_or_else(|| ApiError::unavailable("wallet_unavailable", "No wallet attached"))?;
    Ok(Json(session.user()))
}
