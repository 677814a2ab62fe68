//! User store abstraction.
//!
//! Handlers only see [`UserRepository`], so the Postgres implementation can
//! be swapped for an in-memory one in tests. Failures come back as
//! [`StoreError`], which separates an already-registered Google identity
//! from every other store problem.

use async_trait::async_trait;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use shared_types::User;
use thiserror::Error;

use crate::db::{self, DbPool};
use crate::models::NewUser;

/// Name Postgres gives the unique constraint on `users.google_id`.
const GOOGLE_ID_CONSTRAINT: &str = "users_google_id_key";

#[derive(Debug, Error)]
pub enum StoreError {
    /// A user with this Google id already exists
    #[error("google id already registered")]
    Conflict,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        if is_google_id_conflict(&err) {
            StoreError::Conflict
        } else {
            StoreError::Internal(err.into())
        }
    }
}

// Some drivers omit the constraint name; google_id is the only unique column.
fn is_google_id_conflict(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => info
            .constraint_name()
            .map_or(true, |name| name == GOOGLE_ID_CONSTRAINT),
        _ => false,
    }
}

/// Lookup and creation of users keyed by their Google identity.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;

    /// Insert a user. Returns [`StoreError::Conflict`] when the Google id is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
}

/// Postgres-backed repository over the shared connection pool
pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, StoreError> {
        let mut conn = db::get_conn(&self.pool).await?;
        Ok(db::users::find_by_google_id(&mut conn, google_id).await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let mut conn = db::get_conn(&self.pool).await?;
        Ok(db::users::find_by_id(&mut conn, id).await?)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut conn = db::get_conn(&self.pool).await?;
        Ok(db::users::create(&mut conn, &new_user).await?)
    }
}
