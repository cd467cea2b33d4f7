//! Authentication module.
//!
//! This module decides which route modules require authorization, holds the
//! identity provider settings, and provides the middleware that enforces them.
//!
//! # Pre-conditions
//! - An identity provider project id is available when token authorization is wanted.
//!
//! # Post-conditions
//! - Authentication configuration is immutable once built.
//!
//! # Invariants
//! - Without an identity provider, protected routes reject every request.

pub mod auth_config;
pub mod gate;
pub mod jwks;
pub mod jwt;
pub mod middleware;

pub use auth_config::{AUTHORIZATION_HEADER, AuthConfig, FIREBASE_JWKS_URL};
pub use gate::requires_authorization;
pub use jwks::{JwksCache, JwksError};
pub use middleware::{AuthRejection, AuthState, AuthorizedUser, Authorizer, require_authorized_user};
