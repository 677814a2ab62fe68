use anyhow::{anyhow, bail, Context, Result};
use std::env;

use crate::auth::types::{AuthConfig, SignupMode};

/// Session tokens live for one hour.
const TOKEN_DURATION_HOURS: i64 = 1;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_tls: bool,
    pub port: u16,
    pub jwt_secret: String,
    pub google_client_id: String,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: String,
    pub signup_mode: SignupMode,
    pub cors_allowed_origins: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{} must be set", key))
        };

        let signup_mode = match lookup("SIGNUP_MODE") {
            Some(value) => value
                .parse::<SignupMode>()
                .map_err(|e| anyhow!("SIGNUP_MODE is invalid: {}", e))?,
            None => SignupMode::Profile,
        };

        let google_client_secret = lookup("OAUTH_CLIENT_SECRET").filter(|s| !s.is_empty());
        if signup_mode == SignupMode::CodeExchange && google_client_secret.is_none() {
            bail!("OAUTH_CLIENT_SECRET must be set when SIGNUP_MODE is code_exchange");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_tls: match lookup("DATABASE_TLS") {
                Some(value) => value
                    .parse()
                    .context("DATABASE_TLS must be true or false")?,
                None => true,
            },
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: required("SECRET")?,
            google_client_id: required("OAUTH_CLIENT_ID")?,
            google_client_secret,
            google_redirect_uri: lookup("OAUTH_REDIRECT_URI")
                .unwrap_or_else(|| "postmessage".to_string()),
            signup_mode,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS"),
        })
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_duration_hours: TOKEN_DURATION_HOURS,
            google_client_id: self.google_client_id.clone(),
            google_client_secret: self.google_client_secret.clone(),
            auth_redirect_uri: self.google_redirect_uri.clone(),
            signup_mode: self.signup_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/auth"),
        ("SECRET", "s3cret"),
        ("OAUTH_CLIENT_ID", "client-id"),
    ];

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup_from(MINIMAL)).unwrap();

        assert_eq!(config.port, 3000);
        assert!(config.database_tls);
        assert_eq!(config.signup_mode, SignupMode::Profile);
        assert_eq!(config.google_redirect_uri, "postmessage");
        assert_eq!(config.auth_config().token_duration_hours, 1);
    }

    #[test]
    fn missing_secret_is_reported() {
        let vars: Vec<_> = MINIMAL
            .iter()
            .copied()
            .filter(|(k, _)| *k != "SECRET")
            .collect();
        let err = AppConfig::from_lookup(lookup_from(&vars)).err().unwrap();

        assert!(err.to_string().contains("SECRET must be set"));
    }

    #[test]
    fn code_exchange_requires_client_secret() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("SIGNUP_MODE", "code_exchange"));
        assert!(AppConfig::from_lookup(lookup_from(&vars)).is_err());

        vars.push(("OAUTH_CLIENT_SECRET", "shh"));
        let config = AppConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.signup_mode, SignupMode::CodeExchange);
    }

    #[test]
    fn invalid_port_is_reported() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("PORT", "eighty"));
        let err = AppConfig::from_lookup(lookup_from(&vars)).err().unwrap();

        assert!(err.to_string().contains("PORT"));
    }
}
