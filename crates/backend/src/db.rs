use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{
        deadpool::{Object, Pool},
        AsyncDieselConnectionManager, ManagerConfig,
    },
    AsyncPgConnection, RunQueryDsl,
};
use shared_types::User;

use crate::models::NewUser;

pub type DbPool = Pool<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    // The connection drives the socket; it lives as long as the client does
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    AsyncPgConnection::try_from(client).await
}

/// Build the connection pool. With `tls` off the plain diesel-async
/// connector is used, which suits a local Postgres.
pub fn establish_connection_pool(database_url: &str, tls: bool) -> anyhow::Result<DbPool> {
    let config = if tls {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup =
            Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));

        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            database_url,
            manager_config,
        )
    } else {
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url)
    };

    let pool = Pool::builder(config).build()?;

    Ok(pool)
}

pub async fn get_conn(pool: &DbPool) -> anyhow::Result<Object<AsyncPgConnection>> {
    pool.get()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to get database connection: {}", e))
}

// User database operations
pub mod users {
    use super::*;
    use crate::schema::users;

    type PublicColumns = (
        users::id,
        users::name,
        users::email,
        users::image_url,
        users::google_id,
    );

    /// Columns safe to hand back to clients, in `User` field order.
    const PUBLIC_COLUMNS: PublicColumns = (
        users::id,
        users::name,
        users::email,
        users::image_url,
        users::google_id,
    );

    pub async fn find_by_google_id(
        conn: &mut AsyncPgConnection,
        external_id: &str,
    ) -> QueryResult<Option<User>> {
        users::table
            .filter(users::google_id.eq(external_id))
            .select(PUBLIC_COLUMNS)
            .first::<User>(conn)
            .await
            .optional()
    }

    pub async fn find_by_id(conn: &mut AsyncPgConnection, user_id: i32) -> QueryResult<Option<User>> {
        users::table
            .find(user_id)
            .select(PUBLIC_COLUMNS)
            .first::<User>(conn)
            .await
            .optional()
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_user: &NewUser) -> QueryResult<User> {
        diesel::insert_into(users::table)
            .values(new_user)
            .returning(PUBLIC_COLUMNS)
            .get_result::<User>(conn)
            .await
    }
}
