use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Authenticated caller, attached to the request by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Reads `Authorization: Bearer <token>` and verifies it.
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<AuthUser, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::MissingToken)?;

    let token = match header.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            token.trim()
        }
        _ => return Err(AppError::MissingToken),
    };

    let subject = keys.verify(token).map_err(|e| {
        warn!(reason = %e, "bearer token rejected");
        AppError::from(e)
    })?;

    Ok(AuthUser {
        id: subject.user_id,
        email: subject.email,
    })
}

/// Gate for protected routes: on failure the request ends with 401 and the
/// inner handler never runs.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(req.headers(), &keys)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        let keys = JwtKeys::from_ref(state);
        authenticate(&parts.headers, &keys)
    }
}
