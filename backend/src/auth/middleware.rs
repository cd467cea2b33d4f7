//! Authorization dependency for protected route modules.
//!
//! `require_authorized_user` runs in front of every route of a module that
//! requires authorization. It reads the configured header, verifies the
//! bearer token, and stores the resulting `AuthorizedUser` in the request
//! extensions where handlers pick it up through the extractor.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use super::{AuthConfig, JwksCache, jwt};

/// The user a verified token was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizedUser {
    pub user_id: String,
    pub email: Option<String>,
}

/// Token settings together with the key cache used to verify against them.
#[derive(Debug)]
pub struct Authorizer {
    config: AuthConfig,
    keys: JwksCache,
}

impl Authorizer {
    /// Build an authorizer that fetches keys from `config.jwks_url` on demand.
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let keys = JwksCache::new(config.jwks_url.clone());
        Self { config, keys }
    }

    /// Build an authorizer around an existing key cache.
    #[must_use]
    pub const fn with_keys(config: AuthConfig, keys: JwksCache) -> Self {
        Self { config, keys }
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }
}

/// Process-wide auth state handed to the authorization middleware.
///
/// `None` means no identity provider was configured; protected routes then
/// reject every request.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    authorizer: Option<Arc<Authorizer>>,
}

impl AuthState {
    #[must_use]
    pub fn enabled(authorizer: Authorizer) -> Self {
        Self {
            authorizer: Some(Arc::new(authorizer)),
        }
    }

    #[must_use]
    pub const fn disabled() -> Self {
        Self { authorizer: None }
    }

    #[must_use]
    pub fn config(&self) -> Option<&AuthConfig> {
        self.authorizer.as_deref().map(Authorizer::config)
    }
}

/// Why a request was refused by the authorization dependency.
#[derive(Debug)]
pub enum AuthRejection {
    /// No identity provider is configured.
    NotConfigured,
    /// The configured header is absent or holds no token.
    MissingToken,
    /// The token failed verification.
    InvalidToken(jwt::JwtError),
    /// A handler asked for the user on a route that was not authorized.
    Unauthenticated,
}

impl std::fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "authentication is not configured"),
            Self::MissingToken => write!(f, "missing authorization token"),
            Self::InvalidToken(_) => write!(f, "invalid authorization token"),
            Self::Unauthenticated => write!(f, "not authenticated"),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}

/// Middleware requiring a verified token on every request it guards.
pub async fn require_authorized_user(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let result = authorize(&state, request.headers()).await;
    match result {
        Ok(user) => {
            tracing::debug!("authorized request for user {}", user.user_id);
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(rejection) => {
            if let AuthRejection::InvalidToken(e) = &rejection {
                tracing::debug!("rejected token for {}: {e}", request.uri().path());
            }
            rejection.into_response()
        }
    }
}

async fn authorize(
    state: &AuthState,
    headers: &HeaderMap,
) -> Result<AuthorizedUser, AuthRejection> {
    let Some(authorizer) = state.authorizer.as_deref() else {
        return Err(AuthRejection::NotConfigured);
    };

    let token = headers
        .get(authorizer.config.header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(strip_bearer)
        .filter(|token| !token.is_empty())
        .ok_or(AuthRejection::MissingToken)?;

    jwt::verify_token(token, &authorizer.config, &authorizer.keys)
        .await
        .map_err(AuthRejection::InvalidToken)
}

/// Strip an optional, case-insensitive `Bearer ` scheme prefix.
fn strip_bearer(value: &str) -> &str {
    let value = value.trim_start();
    match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => value[7..].trim(),
        _ => value.trim_end(),
    }
}

impl<S> FromRequestParts<S> for AuthorizedUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthRejection::Unauthenticated)
    }
}
