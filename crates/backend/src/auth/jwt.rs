//! Session token creation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::types::{AuthConfig, Claims};

/// Create a signed session token for a local user id.
pub fn create_token(config: &AuthConfig, user_id: i32) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = Utc::now() + Duration::hours(config.token_duration_hours);

    let claims = Claims {
        id: user_id,
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Validate a session token and return claims.
pub fn validate_token(
    config: &AuthConfig,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::SignupMode;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-key-for-testing-only".to_string(),
            token_duration_hours: 1,
            google_client_id: "test".to_string(),
            google_client_secret: None,
            auth_redirect_uri: "postmessage".to_string(),
            signup_mode: SignupMode::Profile,
        }
    }

    #[test]
    fn test_create_and_validate_token() {
        let config = test_config();
        let token = create_token(&config, 42).expect("should create token");

        let claims = validate_token(&config, &token).expect("should validate token");
        assert_eq!(claims.id, 42);
    }

    #[test]
    fn test_token_expires_in_one_hour() {
        let config = test_config();
        let before = Utc::now().timestamp();
        let token = create_token(&config, 1).expect("should create token");
        let claims = validate_token(&config, &token).expect("should validate token");

        let lifetime = claims.exp - before;
        assert!((3599..=3601).contains(&lifetime), "lifetime was {}", lifetime);
    }

    #[test]
    fn test_token_carries_only_id_and_expiry() {
        let config = test_config();
        let token = create_token(&config, 7).expect("should create token");

        let claims = decode::<serde_json::Map<String, serde_json::Value>>(
            &token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .expect("should decode")
        .claims;

        let mut keys: Vec<&str> = claims.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["exp", "id"]);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = test_config();
        let result = validate_token(&config, "invalid-token");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config();
        let token = create_token(&config, 1).expect("should create token");

        let mut wrong_config = config;
        wrong_config.jwt_secret = "wrong-secret".to_string();

        let result = validate_token(&wrong_config, &token);
        assert!(result.is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_config();
        let claims = Claims {
            id: 1,
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .expect("should encode");

        assert!(validate_token(&config, &token).is_err());
    }
}
