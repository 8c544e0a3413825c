use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{debug, instrument};

use super::{
    dto::{CreateUserRequest, SearchQuery, UpdateUserRequest, UserPage},
    repo_types::User,
};
use crate::{auth::dto::MessageResponse, error::AppError, extract::JsonBody, state::AppState};

/// JSON API; must sit behind the `require_auth` layer.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(search_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Unauthenticated form submission endpoints mounted at the root.
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
}

fn user_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    match path {
        Ok(Path(id)) if id > 0 => Ok(id),
        Ok(_) => Err(AppError::validation("invalid user id")),
        Err(e) => {
            debug!(error = %e, "bad user id in path");
            Err(AppError::validation("invalid user id"))
        }
    }
}

#[instrument(skip(state, query))]
pub async fn search_users(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<UserPage>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let page = state.users.search_users(query).await?;
    Ok(Json(page))
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.users.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, id))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let id = user_id(id)?;
    Ok(Json(state.users.get_user(id).await?))
}

#[instrument(skip(state, id, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let id = user_id(id)?;
    Ok(Json(state.users.update_user(id, payload).await?))
}

#[instrument(skip(state, id))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = user_id(id)?;
    state.users.delete_user(id).await?;
    Ok(Json(MessageResponse {
        message: "user deleted",
    }))
}
