//! ID token verification.
//!
//! Verifies RS256 JSON Web Tokens against the identity provider's published keys.
//!
//! # Pre-conditions
//! - The token header names its signing key through `kid`.
//! - The `AuthConfig` audience is the identity provider project id.
//!
//! # Post-conditions
//! - On success, returns the user identified by the 'sub' claim.
//! - On failure, returns a descriptive error indicating what went wrong.
//!
//! # Invariants
//! - Only RS256 tokens are accepted.
//! - A token is accepted only if it is signed, unexpired, and issued for the configured audience.

use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use super::{AuthConfig, AuthorizedUser, JwksCache, JwksError};

/// Claims extracted from an ID token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject claim containing the user identifier.
    #[serde(default)]
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Error returned when token verification fails.
#[derive(Debug)]
pub enum JwtError {
    /// The token signature is invalid.
    InvalidSignature,
    /// The token has expired.
    TokenExpired,
    /// The token is malformed or cannot be parsed.
    MalformedToken,
    /// The token is signed with an algorithm other than RS256.
    UnsupportedAlgorithm,
    /// The token header has no 'kid'.
    MissingKeyId,
    /// The token was issued for a different audience.
    InvalidAudience,
    /// The 'sub' claim is missing or empty.
    MissingSubClaim,
    /// A claim required for validation is missing.
    MissingClaim(String),
    /// The signing key could not be resolved.
    Key(JwksError),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid JWT signature"),
            Self::TokenExpired => write!(f, "JWT has expired"),
            Self::MalformedToken => write!(f, "malformed JWT"),
            Self::UnsupportedAlgorithm => write!(f, "unsupported JWT algorithm"),
            Self::MissingKeyId => write!(f, "missing 'kid' in JWT header"),
            Self::InvalidAudience => write!(f, "JWT audience mismatch"),
            Self::MissingSubClaim => write!(f, "missing 'sub' claim in JWT"),
            Self::MissingClaim(claim) => write!(f, "missing '{claim}' claim in JWT"),
            Self::Key(e) => write!(f, "signing key unavailable: {e}"),
        }
    }
}

impl std::error::Error for JwtError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Key(e) => Some(e),
            _ => None,
        }
    }
}

/// Verifies an ID token and extracts the authorized user.
///
/// # Errors
/// Returns `JwtError` if verification fails for any reason.
pub async fn verify_token(
    token: &str,
    config: &AuthConfig,
    keys: &JwksCache,
) -> Result<AuthorizedUser, JwtError> {
    let header = decode_header(token).map_err(map_jwt_error)?;
    if header.alg != Algorithm::RS256 {
        return Err(JwtError::UnsupportedAlgorithm);
    }
    let kid = header.kid.ok_or(JwtError::MissingKeyId)?;

    let key = keys.decoding_key(&kid).await.map_err(JwtError::Key)?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[config.audience.as_str()]);
    validation.set_required_spec_claims(&["exp", "aud", "sub"]);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(map_jwt_error)?;

    let Claims { sub, email } = token_data.claims;
    if sub.is_empty() {
        return Err(JwtError::MissingSubClaim);
    }

    Ok(AuthorizedUser {
        user_id: sub,
        email,
    })
}

/// Maps jsonwebtoken errors to our `JwtError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> JwtError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        ErrorKind::InvalidAudience => JwtError::InvalidAudience,
        ErrorKind::InvalidAlgorithm => JwtError::UnsupportedAlgorithm,
        ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => JwtError::MissingSubClaim,
        ErrorKind::MissingRequiredClaim(claim) => JwtError::MissingClaim(claim.clone()),
        _ => JwtError::MalformedToken,
    }
}
