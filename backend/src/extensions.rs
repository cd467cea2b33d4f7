//! Extension descriptors supplied by the hosting platform.
//!
//! The platform passes a JSON array through `DATABUTTON_EXTENSIONS`:
//!
//! ```json
//! [{"name": "firebase-auth", "config": {"firebaseConfig": {"projectId": "my-project"}}}]
//! ```
//!
//! Only the first `firebase-auth` descriptor is consulted. Nothing here
//! fails startup: a missing or malformed value means "no extensions".

use serde::Deserialize;
use serde_json::{Map, Value};

/// Environment variable carrying the extension descriptors.
pub const EXTENSIONS_ENV_VAR: &str = "DATABUTTON_EXTENSIONS";

/// Name of the extension carrying the identity provider settings.
pub const FIREBASE_AUTH_EXTENSION: &str = "firebase-auth";

/// A named extension record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Extension {
    pub name: String,
    #[serde(default)]
    pub config: Value,
}

/// Firebase settings nested under `config.firebaseConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FirebaseConfig {
    /// The Firebase project, used as the expected token audience.
    #[serde(rename = "projectId")]
    pub project_id: String,
    /// Remaining keys of the payload (apiKey, authDomain, ...), kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error returned when the extension descriptors cannot be parsed.
#[derive(Debug)]
pub struct ExtensionsError(serde_json::Error);

impl std::fmt::Display for ExtensionsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed extension descriptors: {}", self.0)
    }
}

impl std::error::Error for ExtensionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Parse a JSON array of extension descriptors.
///
/// # Errors
/// Returns `ExtensionsError` if `raw` is not an array of `{name, config}` records.
pub fn parse_extensions(raw: &str) -> Result<Vec<Extension>, ExtensionsError> {
    serde_json::from_str(raw).map_err(ExtensionsError)
}

/// Find the Firebase settings among the extension descriptors in `raw`.
///
/// An unset value is treated as `[]`. A malformed value is logged and
/// treated as `[]`. A `firebase-auth` descriptor without a usable
/// `firebaseConfig.projectId` is logged and yields `None`.
#[must_use]
pub fn resolve_identity_provider_config(raw: Option<&str>) -> Option<FirebaseConfig> {
    let extensions = match raw.map(parse_extensions) {
        None => Vec::new(),
        Some(Ok(extensions)) => extensions,
        Some(Err(e)) => {
            tracing::warn!("Ignoring {EXTENSIONS_ENV_VAR}: {e}");
            Vec::new()
        }
    };

    let extension = extensions
        .iter()
        .find(|extension| extension.name == FIREBASE_AUTH_EXTENSION)?;

    let Some(payload) = extension.config.get("firebaseConfig") else {
        tracing::warn!("{FIREBASE_AUTH_EXTENSION} extension has no firebaseConfig");
        return None;
    };

    match FirebaseConfig::deserialize(payload) {
        Ok(config) if config.project_id.is_empty() => {
            tracing::warn!("{FIREBASE_AUTH_EXTENSION} extension has an empty projectId");
            None
        }
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(
                "{FIREBASE_AUTH_EXTENSION} extension has an invalid firebaseConfig: {e}"
            );
            None
        }
    }
}
