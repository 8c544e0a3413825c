use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{ChangePasswordRequest, LoginRequest, LoginResponse, MeResponse, MessageResponse, RegisterResponse},
    extractors::AuthUser,
};
use crate::{
    error::AppError,
    extract::JsonBody,
    state::AppState,
    users::dto::{CreateUserRequest, UserSummary},
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Must sit behind the `require_auth` layer.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/change-password", post(change_password))
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = state.auth.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "registered",
            user: UserSummary::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (user, token) = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(LoginResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

/// Tokens are not tracked server side; the client just drops its copy.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "logged out",
    })
}

#[instrument(skip(state, caller), fields(user_id = caller.id))]
pub async fn get_me(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = state.auth.get_user(caller.id).await?;
    Ok(Json(MeResponse::from(user)))
}

#[instrument(skip(state, caller, payload), fields(user_id = caller.id))]
pub async fn change_password(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth
        .change_password(caller.id, &payload.old_password, &payload.new_password)
        .await?;
    info!(user_id = caller.id, "password change acknowledged");
    Ok(Json(MessageResponse {
        message: "password changed",
    }))
}
