use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::error::ApiError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/users", post(register_user))
}

// POST /api/users
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    username: String,
}

async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    req.validate().map_err(|e| {
        ApiError::new(StatusCode::BAD_REQUEST, "invalid_username", e.to_string())
    })?;

    let username = state.accounts.register(&req.username).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { username })))
}
