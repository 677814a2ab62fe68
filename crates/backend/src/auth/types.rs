//! Auth-related types and configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Session token claims: the local user id and nothing else besides expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Local user id
    pub id: i32,
    /// Expiration timestamp
    pub exp: i64,
}

/// Validated user from the session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
}

/// Which signup payload `POST /signup` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupMode {
    /// Client sends name, email, imageUrl, googleId and an ID token
    Profile,
    /// Client sends an authorization code; the profile comes from Google
    CodeExchange,
}

impl FromStr for SignupMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "profile" => Ok(SignupMode::Profile),
            "code_exchange" | "code-exchange" => Ok(SignupMode::CodeExchange),
            other => Err(format!(
                "unknown signup mode '{}', expected 'profile' or 'code_exchange'",
                other
            )),
        }
    }
}

/// Auth configuration, built once at startup and shared by every request
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_duration_hours: i64,
    pub google_client_id: String,
    pub google_client_secret: Option<String>,
    pub auth_redirect_uri: String,
    pub signup_mode: SignupMode,
}
