use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::users::RegisterCommand;

use super::user_to_api;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use crate::infra::http::state::HttpState;

pub async fn register(
    State(state): State<HttpState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .register(RegisterCommand {
            name: payload.name,
            username: payload.username,
            password: payload.password,
        })
        .await
        .map_err(user_to_api)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn login(
    State(state): State<HttpState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .users
        .login(&payload.username, &payload.password)
        .await
        .map_err(user_to_api)?;

    Ok(Json(LoginResponse {
        access_token: session.token,
        expires_at: session.expires_at,
    }))
}
