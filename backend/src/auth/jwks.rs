//! JSON Web Key Set cache.
//!
//! Holds the signing keys published by the identity provider and hands out
//! decoding keys by key id. Keys are fetched lazily on first use and
//! refetched when a token names a key id the cache does not know, which is
//! how provider key rotation shows up.
//!
//! # Thread Safety
//!
//! The cached key set sits behind an `RwLock`. The lock is only taken in
//! synchronous helpers and never held across an `.await`.
//!
//! # Invariants
//! - The cache holds either nothing or a complete key set.
//! - At most one fetch per `MIN_REFRESH_INTERVAL`, whether the last one
//!   succeeded or failed.
//! - A fetch gives up after the fetch timeout.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;

/// Minimum time between fetches.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Default limit on a single key set fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when resolving a signing key.
#[derive(Debug)]
pub enum JwksError {
    /// The key set could not be fetched or decoded.
    Fetch(reqwest::Error),
    /// The last fetch failed and the next one is not due yet.
    Unavailable,
    /// No key with this id is published.
    UnknownKeyId(String),
    /// The published key cannot be used for verification.
    InvalidKey(String),
    /// The cache lock was poisoned by a panicking thread.
    LockPoisoned,
}

impl std::fmt::Display for JwksError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "failed to fetch JWKS: {e}"),
            Self::Unavailable => write!(f, "JWKS unavailable after a failed fetch"),
            Self::UnknownKeyId(kid) => write!(f, "unknown key id: {kid}"),
            Self::InvalidKey(reason) => write!(f, "invalid JWK: {reason}"),
            Self::LockPoisoned => write!(f, "JWKS cache lock poisoned"),
        }
    }
}

impl std::error::Error for JwksError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Unavailable
            | Self::UnknownKeyId(_)
            | Self::InvalidKey(_)
            | Self::LockPoisoned => None,
        }
    }
}

#[derive(Default)]
struct CachedKeys {
    /// The last key set fetched successfully.
    set: Option<JwkSet>,
    /// When the last fetch finished, successful or not.
    attempted_at: Option<Instant>,
}

enum Lookup {
    Found(DecodingKey),
    /// The key id is unknown and the last fetch is too recent to refetch.
    Missing,
    /// No key set is held and the last fetch, which failed, is too recent to retry.
    Unavailable,
    /// Never fetched, or the last fetch is old enough to refetch.
    Refresh,
}

/// Cache of the identity provider's signing keys.
pub struct JwksCache {
    jwks_url: String,
    client: reqwest::Client,
    fetch_timeout: Duration,
    keys: RwLock<CachedKeys>,
}

impl JwksCache {
    /// Create an empty cache for `jwks_url`. Nothing is fetched until the first lookup.
    #[must_use]
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            client: reqwest::Client::new(),
            fetch_timeout: FETCH_TIMEOUT,
            keys: RwLock::new(CachedKeys::default()),
        }
    }

    /// Create a cache already holding `set`, as if it had just been fetched.
    #[must_use]
    pub fn with_keys(jwks_url: impl Into<String>, set: JwkSet) -> Self {
        Self {
            keys: RwLock::new(CachedKeys {
                set: Some(set),
                attempted_at: Some(Instant::now()),
            }),
            ..Self::new(jwks_url)
        }
    }

    /// Limit each key set fetch to `timeout` instead of the default.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Get the decoding key for `kid`, fetching the key set if needed.
    ///
    /// # Errors
    /// Returns `JwksError::Fetch` if a needed fetch fails,
    /// `JwksError::Unavailable` while backing off after a failed fetch,
    /// `JwksError::UnknownKeyId` if no published key has this id, and
    /// `JwksError::InvalidKey` if the published key is unusable.
    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        // Fast path: answer from the cache
        match self.lookup(kid)? {
            Lookup::Found(key) => return Ok(key),
            Lookup::Missing => return Err(JwksError::UnknownKeyId(kid.to_string())),
            Lookup::Unavailable => return Err(JwksError::Unavailable),
            Lookup::Refresh => {}
        }

        // Slow path: refetch, then answer from the fresh set
        let set = match self.fetch().await {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!("Failed to fetch JWKS from {}: {e}", self.jwks_url);
                self.record_attempt(None)?;
                return Err(e);
            }
        };
        let key = match set.find(kid) {
            Some(jwk) => {
                DecodingKey::from_jwk(jwk).map_err(|e| JwksError::InvalidKey(e.to_string()))
            }
            None => Err(JwksError::UnknownKeyId(kid.to_string())),
        };
        self.record_attempt(Some(set))?;
        key
    }

    fn lookup(&self, kid: &str) -> Result<Lookup, JwksError> {
        let keys = self.keys.read().map_err(|_| JwksError::LockPoisoned)?;
        if let Some(jwk) = keys.set.as_ref().and_then(|set| set.find(kid)) {
            let key =
                DecodingKey::from_jwk(jwk).map_err(|e| JwksError::InvalidKey(e.to_string()))?;
            return Ok(Lookup::Found(key));
        }
        match keys.attempted_at {
            Some(at) if at.elapsed() < MIN_REFRESH_INTERVAL => {
                if keys.set.is_some() {
                    Ok(Lookup::Missing)
                } else {
                    Ok(Lookup::Unavailable)
                }
            }
            _ => Ok(Lookup::Refresh),
        }
    }

    /// Record a finished fetch. A failed fetch (`None`) keeps the previous key set.
    fn record_attempt(&self, set: Option<JwkSet>) -> Result<(), JwksError> {
        let mut keys = self.keys.write().map_err(|_| JwksError::LockPoisoned)?;
        if set.is_some() {
            keys.set = set;
        }
        keys.attempted_at = Some(Instant::now());
        Ok(())
    }

    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        tracing::debug!("Fetching JWKS from {}", self.jwks_url);
        let set = self
            .client
            .get(&self.jwks_url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(JwksError::Fetch)?
            .json::<JwkSet>()
            .await
            .map_err(JwksError::Fetch)?;
        tracing::info!("Fetched {} signing keys from {}", set.keys.len(), self.jwks_url);
        Ok(set)
    }
}

impl std::fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksCache")
            .field("jwks_url", &self.jwks_url)
            .finish_non_exhaustive()
    }
}
