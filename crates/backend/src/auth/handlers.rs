//! Authentication HTTP handlers.
//!
//! Signup runs validate, verify identity, persist, issue session. Login runs
//! validate, look up, verify identity, issue session. Each step either
//! advances or ends the request with one [`ApiError`].

use anyhow::anyhow;
use axum::{body::Bytes, extract::State, Extension, Json};
use shared_types::{AuthResponse, CodeSignupRequest, LoginRequest, MeResponse, SignupRequest, User};

use crate::error::{ApiError, ApiResult};
use crate::models::NewUser;
use crate::validation::read_payload;
use crate::AppState;

use super::{
    google::{identity_from_code, verify_google_token},
    jwt,
    types::{AuthUser, SignupMode},
};

/// Create an account from a Google identity.
pub async fn signup(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<AuthResponse>> {
    let new_user = match state.auth_config.signup_mode {
        SignupMode::Profile => verified_profile(&state, &body).await?,
        SignupMode::CodeExchange => profile_from_code(&state, &body).await?,
    };

    let user = state.users.create(new_user).await.map_err(|e| {
        tracing::info!("Signup rejected: {}", e);
        ApiError::from(e)
    })?;

    tracing::info!(user_id = user.id, "Account created");

    respond_with_session(&state, user)
}

/// Authenticate an existing account.
pub async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<AuthResponse>> {
    let request: LoginRequest = read_payload(&body)?;

    let google_id = request.google_id.unwrap_or_default();
    let google_token = request.google_token.unwrap_or_default();

    let user = state
        .users
        .find_by_google_id(&google_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    if !verify_google_token(state.identity.as_ref(), &google_token, &google_id).await {
        return Err(ApiError::InvalidToken);
    }

    tracing::info!(user_id = user.id, "Successful login");

    respond_with_session(&state, user)
}

/// Current session's user.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<MeResponse>> {
    let user = state
        .users
        .find_by_id(auth_user.id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(MeResponse { user }))
}

/// Client-supplied profile, accepted once the ID token proves the googleId.
async fn verified_profile(state: &AppState, body: &[u8]) -> ApiResult<NewUser> {
    let request: SignupRequest = read_payload(body)?;

    let google_id = request.google_id.unwrap_or_default();
    let google_token = request.google_token.unwrap_or_default();

    if !verify_google_token(state.identity.as_ref(), &google_token, &google_id).await {
        return Err(ApiError::InvalidToken);
    }

    Ok(NewUser {
        name: request.name.unwrap_or_default(),
        email: request.email.unwrap_or_default(),
        image_url: request.image_url.unwrap_or_default(),
        google_id,
    })
}

/// Profile derived server-side from an authorization code.
async fn profile_from_code(state: &AppState, body: &[u8]) -> ApiResult<NewUser> {
    let request: CodeSignupRequest = read_payload(body)?;

    let code = request.google_access_token.unwrap_or_default();
    let identity = identity_from_code(state.identity.as_ref(), &code)
        .await
        .ok_or(ApiError::InvalidToken)?;

    Ok(NewUser {
        name: identity.name,
        email: identity.email,
        image_url: identity.picture,
        google_id: identity.subject,
    })
}

fn respond_with_session(state: &AppState, user: User) -> ApiResult<Json<AuthResponse>> {
    let token = jwt::create_token(&state.auth_config, user.id)
        .map_err(|e| ApiError::Internal(anyhow!("Failed to create token: {}", e)))?;

    Ok(Json(AuthResponse { token, user }))
}
