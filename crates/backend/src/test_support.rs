//! In-memory stand-ins for the user store and Google, shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use shared_types::User;

use crate::auth::google::{IdTokenClaims, IdentityProvider, ProviderError, TokenBundle};
use crate::auth::types::{AuthConfig, SignupMode};
use crate::models::NewUser;
use crate::repository::{StoreError, UserRepository};
use crate::AppState;

pub fn test_auth_config(signup_mode: SignupMode) -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret-key-for-testing-only".to_string(),
        token_duration_hours: 1,
        google_client_id: "test-client".to_string(),
        google_client_secret: Some("test-client-secret".to_string()),
        auth_redirect_uri: "postmessage".to_string(),
        signup_mode,
    }
}

pub fn test_state(
    users: Arc<MemoryUsers>,
    identity: Arc<StubIdentity>,
    signup_mode: SignupMode,
) -> AppState {
    AppState {
        users,
        identity,
        auth_config: test_auth_config(signup_mode),
    }
}

/// User store backed by a vector, enforcing google_id uniqueness.
pub struct MemoryUsers {
    users: Mutex<Vec<User>>,
    failing: bool,
}

impl MemoryUsers {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            users: Mutex::new(Vec::new()),
            failing: false,
        })
    }

    /// Store holding the canonical test user with the given google id.
    pub fn with_user(google_id: &str) -> Arc<Self> {
        let store = Self::empty();
        store.users.lock().unwrap().push(User {
            id: 1,
            name: "name".to_string(),
            email: "email@email.com".to_string(),
            image_url: "https://image.com".to_string(),
            google_id: google_id.to_string(),
        });
        store
    }

    /// Store whose every operation fails as if the database were down.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            users: Mutex::new(Vec::new()),
            failing: true,
        })
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Internal(anyhow!("database unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.google_id == google_id).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.google_id == new_user.google_id) {
            return Err(StoreError::Conflict);
        }

        let user = User {
            id: users.len() as i32 + 1,
            name: new_user.name,
            email: new_user.email,
            image_url: new_user.image_url,
            google_id: new_user.google_id,
        };
        users.push(user.clone());
        Ok(user)
    }
}

/// Identity provider that either vouches for one subject or rejects everything.
pub struct StubIdentity {
    subject: Option<String>,
    with_profile: bool,
    calls: AtomicUsize,
}

impl StubIdentity {
    pub fn accepting(subject: &str) -> Self {
        Self {
            subject: Some(subject.to_string()),
            with_profile: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            subject: None,
            with_profile: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Tokens verify but carry no name, email or picture.
    pub fn without_profile(mut self) -> Self {
        self.with_profile = false;
        self
    }

    /// Number of provider round trips made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn verify_id_token(&self, _id_token: &str) -> Result<IdTokenClaims, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let subject = self
            .subject
            .clone()
            .ok_or_else(|| ProviderError::KeyNotFound("stub".to_string()))?;

        let profile = |value: &str| self.with_profile.then(|| value.to_string());
        Ok(IdTokenClaims {
            sub: subject,
            name: profile("name"),
            email: profile("email@email.com"),
            picture: profile("https://image.com"),
        })
    }

    async fn exchange_code(&self, _code: &str) -> Result<TokenBundle, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.subject.is_none() {
            return Err(ProviderError::MissingIdToken);
        }
        Ok(TokenBundle {
            id_token: Some("stub-id-token".to_string()),
        })
    }
}
