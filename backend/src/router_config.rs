//! Per-route-module settings loaded from `routers.json`.
//!
//! File shape:
//!
//! ```json
//! { "routers": { "<module name>": { "disableAuth": true } } }
//! ```
//!
//! # Invariants
//! - A module absent from the file requires authorization.
//! - The config is immutable once loaded.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Error returned when the router config file cannot be loaded.
#[derive(Debug)]
pub enum RouterConfigError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The file is not valid router config JSON.
    Parse(serde_json::Error),
}

impl std::fmt::Display for RouterConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read router config: {e}"),
            Self::Parse(e) => write!(f, "failed to parse router config: {e}"),
        }
    }
}

impl std::error::Error for RouterConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

/// Settings for a single route module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouterSettings {
    /// When true, the module's routes are mounted without the authorization dependency.
    #[serde(default, rename = "disableAuth")]
    pub disable_auth: bool,
}

/// Mapping from route module name to its settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    routers: HashMap<String, RouterSettings>,
}

impl RouterConfig {
    /// Load the router config from `path`.
    ///
    /// # Errors
    /// Returns `RouterConfigError::Io` if the file cannot be read and
    /// `RouterConfigError::Parse` if its contents are not valid.
    pub fn load(path: &Path) -> Result<Self, RouterConfigError> {
        let contents = std::fs::read_to_string(path).map_err(RouterConfigError::Io)?;
        Self::parse(&contents)
    }

    /// Parse a router config document.
    ///
    /// # Errors
    /// Returns `RouterConfigError::Parse` if `contents` is not valid.
    pub fn parse(contents: &str) -> Result<Self, RouterConfigError> {
        serde_json::from_str(contents).map_err(RouterConfigError::Parse)
    }

    /// Load the router config, falling back to an empty config on any failure.
    ///
    /// With an empty config every route module requires authorization.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                tracing::info!(
                    "Loaded router config from {} ({} entries)",
                    path.display(),
                    config.routers.len()
                );
                config
            }
            Err(e) => {
                tracing::warn!("Router config load failed ({}): {e}", path.display());
                Self::default()
            }
        }
    }

    /// Whether `module_name` is explicitly marked `disableAuth: true`.
    #[must_use]
    pub fn is_auth_disabled(&self, module_name: &str) -> bool {
        self.routers
            .get(module_name)
            .is_some_and(|settings| settings.disable_auth)
    }

    /// Settings for `module_name`, if it has an entry.
    #[must_use]
    pub fn settings(&self, module_name: &str) -> Option<&RouterSettings> {
        self.routers.get(module_name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(
            r#"{"routers": {"health": {"disableAuth": true}, "cases": {"disableAuth": false}}}"#,
        );

        let config = RouterConfig::load(file.path()).expect("valid config");

        assert!(config.is_auth_disabled("health"));
        assert!(!config.is_auth_disabled("cases"));
        assert!(!config.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = RouterConfig::load(&dir.path().join("routers.json"));
        assert!(matches!(result, Err(RouterConfigError::Io(_))));
    }

    #[test]
    fn test_load_or_default_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = RouterConfig::load_or_default(&dir.path().join("routers.json"));
        assert!(config.is_empty());
    }

    #[test]
    fn test_load_or_default_malformed_files_are_empty() {
        for contents in [
            "",
            "not json",
            "{\"routers\": ",
            "[]",
            r#"{"routers": []}"#,
            r#"{"routers": {"cases": {"disableAuth": "yes"}}}"#,
        ] {
            let file = write_config(contents);
            let config = RouterConfig::load_or_default(file.path());
            assert!(config.is_empty(), "expected empty config for {contents:?}");
        }
    }

    #[test]
    fn test_missing_routers_key_is_empty() {
        let config = RouterConfig::parse(r#"{"other": 1}"#).expect("valid document");
        assert!(config.is_empty());
    }

    #[test]
    fn test_entry_without_disable_auth_requires_auth() {
        let config = RouterConfig::parse(r#"{"routers": {"cases": {}}}"#).expect("valid config");

        assert_eq!(config.settings("cases"), Some(&RouterSettings::default()));
        assert!(!config.is_auth_disabled("cases"));
    }

    #[test]
    fn test_unknown_module_is_not_disabled() {
        let config = RouterConfig::parse(r#"{"routers": {"health": {"disableAuth": true}}}"#)
            .expect("valid config");

        assert!(!config.is_auth_disabled("cases"));
        assert!(!config.is_auth_disabled(""));
        assert!(!RouterConfig::default().is_auth_disabled("health"));
    }

    #[test]
    fn test_router_config_error_display() {
        let io = RouterConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        assert_eq!(io.to_string(), "failed to read router config: no such file");

        let parse = RouterConfig::parse("nope").expect_err("invalid json");
        assert!(parse.to_string().starts_with("failed to parse router config"));
    }
}
