use axum::http::{header, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod config;
mod db;
pub mod error;
mod models;
pub mod repository;
mod routes;
mod schema;
#[cfg(test)]
mod test_support;
mod validation;

use crate::auth::google::{GoogleClient, IdentityProvider};
use crate::auth::types::AuthConfig;
use crate::config::AppConfig;
use crate::repository::{PgUserRepository, UserRepository};

/// Process-wide collaborators, constructed once in `main` and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub auth_config: AuthConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before the log filter, which reads RUST_LOG
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let auth_config = config.auth_config();

    // Establish database connection pool
    let pool = db::establish_connection_pool(&config.database_url, config.database_tls)?;

    tracing::info!("Signup mode: {:?}", auth_config.signup_mode);

    let state = AppState {
        users: Arc::new(PgUserRepository::new(pool)),
        identity: Arc::new(GoogleClient::new(&auth_config)),
        auth_config,
    };

    let app = routes::build_router(state).layer(build_cors_layer(
        config.cors_allowed_origins.as_deref(),
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build CORS layer based on configuration.
///
/// If allowed origins are given, only those origins are allowed.
/// If not, defaults to permissive CORS.
fn build_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    match allowed_origins {
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                tracing::warn!(
                    "CORS_ALLOWED_ORIGINS is set but empty, using permissive CORS (not recommended for production)"
                );
                CorsLayer::permissive()
            } else {
                tracing::info!("CORS configured for origins: {:?}", origins);
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::warn!(
                "CORS_ALLOWED_ORIGINS not set, using permissive CORS (not recommended for production)"
            );
            CorsLayer::permissive()
        }
    }
}
