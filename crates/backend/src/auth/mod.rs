//! Authentication module for Google sign-in with JWT sessions.
//!
//! This module provides:
//! - Google ID token verification and authorization-code exchange
//! - Signup and login handlers that issue session tokens
//! - Session token creation and validation
//! - `require_auth` middleware for protecting routes

pub mod google;
mod handlers;
mod jwt;
mod middleware;
pub mod types;

pub use handlers::{login, me, signup};
pub use middleware::require_auth;
