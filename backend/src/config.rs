//! Server configuration module.
//!
//! This module provides configuration loading for the backend from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `LEGALOPS_LISTEN_ADDRESS`: IP address to bind (default: `127.0.0.1`)
//! - `LEGALOPS_LISTEN_PORT`: Port to listen on (default: `8000`)
//! - `LEGALOPS_ROUTER_CONFIG`: Path of the router config file (default: `routers.json`)
//! - `DATABUTTON_EXTENSIONS`: JSON array of extension descriptors (optional)
//!
//! # Invariants
//!
//! - `listen_port` is always a valid port number
//! - `router_config_path` is always a path (the file may not exist)

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::extensions::EXTENSIONS_ENV_VAR;

const LISTEN_ADDRESS_ENV_VAR: &str = "LEGALOPS_LISTEN_ADDRESS";
const LISTEN_PORT_ENV_VAR: &str = "LEGALOPS_LISTEN_PORT";
const ROUTER_CONFIG_ENV_VAR: &str = "LEGALOPS_ROUTER_CONFIG";

/// Server configuration.
///
/// Contains all configuration parameters needed to start the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub listen_address: IpAddr,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
    /// Location of the router config file, relative to the working directory
    /// unless absolute.
    pub router_config_path: PathBuf,
    /// Raw value of the extension descriptor variable, if set.
    /// Parsed later by [`crate::extensions::resolve_identity_provider_config`].
    pub extensions: Option<String>,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 8000;
    /// Default bind address.
    pub const DEFAULT_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    /// Default router config file name.
    pub const DEFAULT_ROUTER_CONFIG_PATH: &'static str = "routers.json";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `LEGALOPS_LISTEN_ADDRESS` or `LEGALOPS_LISTEN_PORT`
    /// is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// `from_env` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_address = Self::load_listen_address(&lookup)?;
        let listen_port = Self::load_listen_port(&lookup)?;
        let router_config_path = lookup(ROUTER_CONFIG_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map_or_else(
                || PathBuf::from(Self::DEFAULT_ROUTER_CONFIG_PATH),
                PathBuf::from,
            );
        let extensions = lookup(EXTENSIONS_ENV_VAR);

        Ok(Self {
            listen_address,
            listen_port,
            router_config_path,
            extensions,
        })
    }

    fn load_listen_address<F>(lookup: &F) -> Result<IpAddr, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(LISTEN_ADDRESS_ENV_VAR) {
            Some(value) => value.parse::<IpAddr>().map_err(|_| ConfigError::InvalidValue {
                name: LISTEN_ADDRESS_ENV_VAR.to_string(),
                message: format!("'{value}' is not a valid IP address"),
            }),
            None => Ok(Self::DEFAULT_ADDRESS),
        }
    }

    /// Load the listen port.
    ///
    /// Returns the default if not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is set but not a valid port number.
    fn load_listen_port<F>(lookup: &F) -> Result<u16, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(LISTEN_PORT_ENV_VAR) {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: LISTEN_PORT_ENV_VAR.to_string(),
                message: format!("'{value}' is not a valid port number (must be 0-65535)"),
            }),
            None => Ok(Self::DEFAULT_PORT),
        }
    }
}
