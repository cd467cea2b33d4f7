//! Token authorization settings.
//!
//! # Invariants
//! - `audience` is never empty.
//! - `AuthConfig` instances are immutable once created.

use crate::extensions::FirebaseConfig;

/// JWKS endpoint publishing the keys that sign Firebase ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Where to find signing keys, which audience to expect, and which header to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub jwks_url: String,
    pub audience: String,
    pub header: String,
}

impl AuthConfig {
    /// Settings for verifying ID tokens issued for a Firebase project.
    #[must_use]
    pub fn for_firebase(config: &FirebaseConfig) -> Self {
        Self {
            jwks_url: FIREBASE_JWKS_URL.to_string(),
            audience: config.project_id.clone(),
            header: AUTHORIZATION_HEADER.to_string(),
        }
    }
}
