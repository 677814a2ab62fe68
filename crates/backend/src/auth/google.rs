//! Google identity verification.
//!
//! [`IdentityProvider`] is the narrow seam the handlers depend on; the
//! [`GoogleClient`] implementation checks ID tokens against Google's
//! published signing keys and exchanges authorization codes. Callers go
//! through [`verify_google_token`] and [`identity_from_code`], which fold
//! every provider failure into a plain "no".

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header,
    jwk::JwkSet,
    Algorithm, DecodingKey, Validation,
};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use super::types::AuthConfig;

pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// How long fetched signing keys are trusted before refetching
const JWKS_TTL_SECS: i64 = 3600;

/// An unknown kid only triggers a refetch once the key set is at least this old
const JWKS_REFETCH_FLOOR_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to Google failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    TokenExchange {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("id token rejected: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("no Google signing key matches kid '{0}'")]
    KeyNotFound(String),

    #[error("token response carried no id_token")]
    MissingIdToken,

    #[error("id token has no {0} claim")]
    MissingClaim(&'static str),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Verified payload of a Google ID token
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    /// Google's stable user id
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

/// Complete identity derived from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    pub subject: String,
    pub name: String,
    pub email: String,
    pub picture: String,
}

impl TryFrom<IdTokenClaims> for IdentityClaim {
    type Error = ProviderError;

    fn try_from(claims: IdTokenClaims) -> Result<Self, Self::Error> {
        Ok(IdentityClaim {
            subject: claims.sub,
            name: claims.name.ok_or(ProviderError::MissingClaim("name"))?,
            email: claims.email.ok_or(ProviderError::MissingClaim("email"))?,
            picture: claims.picture.ok_or(ProviderError::MissingClaim("picture"))?,
        })
    }
}

/// Tokens returned by the authorization-code exchange
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBundle {
    pub id_token: Option<String>,
}

/// An external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check signature, audience, issuer and expiry of an ID token.
    async fn verify_id_token(&self, id_token: &str) -> Result<IdTokenClaims, ProviderError>;

    /// Trade a one-time authorization code for a token bundle.
    async fn exchange_code(&self, code: &str) -> Result<TokenBundle, ProviderError>;
}

/// True only if the token verifies and was issued for `google_id`.
pub async fn verify_google_token(
    provider: &dyn IdentityProvider,
    token: &str,
    google_id: &str,
) -> bool {
    match provider.verify_id_token(token).await {
        Ok(claims) if claims.sub == google_id => true,
        Ok(_) => {
            tracing::warn!("Google token subject does not match the supplied googleId");
            false
        }
        Err(e) => {
            tracing::debug!("Google token verification failed: {}", e);
            false
        }
    }
}

/// Exchange a code and verify the resulting ID token, returning the full profile.
pub async fn identity_from_code(
    provider: &dyn IdentityProvider,
    code: &str,
) -> Option<IdentityClaim> {
    let result = async {
        let bundle = provider.exchange_code(code).await?;
        let id_token = bundle.id_token.ok_or(ProviderError::MissingIdToken)?;
        let claims = provider.verify_id_token(&id_token).await?;
        IdentityClaim::try_from(claims)
    }
    .await;

    match result {
        Ok(identity) => Some(identity),
        Err(e) => {
            tracing::debug!("Google code exchange failed: {}", e);
            None
        }
    }
}

struct CachedJwks {
    keys: JwkSet,
    fetched_at: DateTime<Utc>,
}

impl CachedJwks {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.fetched_at + Duration::seconds(JWKS_TTL_SECS)
    }

    /// Answer from the cache, or `None` when the key set should be refetched.
    fn lookup(&self, kid: &str, now: DateTime<Utc>) -> Option<Result<DecodingKey, ProviderError>> {
        if !self.is_fresh(now) {
            return None;
        }

        match self.keys.find(kid) {
            Some(jwk) => Some(DecodingKey::from_jwk(jwk).map_err(ProviderError::from)),
            None if now < self.fetched_at + Duration::seconds(JWKS_REFETCH_FLOOR_SECS) => {
                Some(Err(ProviderError::KeyNotFound(kid.to_string())))
            }
            None => None,
        }
    }
}

/// Google OAuth client backed by reqwest.
pub struct GoogleClient {
    // TODO: give this client a request timeout; a stalled Google endpoint
    // currently holds the request open indefinitely.
    http: reqwest::Client,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
    jwks: RwLock<Option<CachedJwks>>,
}

impl GoogleClient {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.auth_redirect_uri.clone(),
            jwks: RwLock::new(None),
        }
    }

    /// Resolve the key for `kid`, refetching the key set when the cache is
    /// stale or does not know the kid (Google rotates keys). Refetches are
    /// serialized behind the write lock.
    async fn signing_key(&self, kid: &str) -> Result<DecodingKey, ProviderError> {
        if let Some(found) = self
            .jwks
            .read()
            .await
            .as_ref()
            .and_then(|cached| cached.lookup(kid, Utc::now()))
        {
            return found;
        }

        let mut cache = self.jwks.write().await;
        // Another request may have refreshed the set while this one waited
        if let Some(found) = cache
            .as_ref()
            .and_then(|cached| cached.lookup(kid, Utc::now()))
        {
            return found;
        }

        tracing::debug!("Fetching Google signing keys");
        let keys: JwkSet = self
            .http
            .get(GOOGLE_CERTS_URL)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let key = keys
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()?
            .ok_or_else(|| ProviderError::KeyNotFound(kid.to_string()));

        *cache = Some(CachedJwks {
            keys,
            fetched_at: Utc::now(),
        });

        key
    }
}

#[async_trait]
impl IdentityProvider for GoogleClient {
    async fn verify_id_token(&self, id_token: &str) -> Result<IdTokenClaims, ProviderError> {
        let header = decode_header(id_token)?;
        let kid = header
            .kid
            .ok_or_else(|| ProviderError::KeyNotFound("missing".to_string()))?;
        let key = self.signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let token_data = decode::<IdTokenClaims>(id_token, &key, &validation)?;
        Ok(token_data.claims)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenBundle, ProviderError> {
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or(ProviderError::NotConfigured("OAUTH_CLIENT_SECRET"))?;

        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", client_secret),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::TokenExchange { status, body });
        }

        Ok(response.json().await?)
    }
}
