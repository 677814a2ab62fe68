//! Authentication middleware layer for protecting routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::AppState;

use super::jwt;
use super::types::{AuthConfig, AuthUser};

/// Middleware function that requires a valid session token.
///
/// Use with `axum::middleware::from_fn_with_state`. On success the
/// [`AuthUser`] is available to handlers as an `Extension`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match extract_auth_user(request.headers(), &state.auth_config) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Extract and validate the session user from an `Authorization: Bearer` header.
pub fn extract_auth_user(headers: &HeaderMap, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

    let invalid = || ApiError::Unauthorized("Invalid token".to_string());

    let value = value.to_str().map_err(|_| invalid())?;
    let parts: Vec<&str> = value.split(' ').collect();
    let [scheme, token] = parts.as_slice() else {
        return Err(invalid());
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(invalid());
    }

    let claims = jwt::validate_token(config, token).map_err(|_| invalid())?;

    Ok(AuthUser { id: claims.id })
}
