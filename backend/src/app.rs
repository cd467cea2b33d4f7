//! Application assembly.
//!
//! Builds the axum application from values loaded at startup: the liveness
//! endpoint at `/`, every route module under `/routes`, and the auth state
//! derived from the identity provider config.
//!
//! # Post-conditions
//! - `GET /` answers regardless of auth and router configuration.
//! - `auth_config()` is `Some` exactly when an identity provider config was given.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::auth::{AuthConfig, AuthState, Authorizer};
use crate::extensions::FirebaseConfig;
use crate::router_config::RouterConfig;
use crate::routes::{DiscoveryReport, RouteModule, discover_routes};

/// Body of the liveness response.
pub const ROOT_MESSAGE: &str = "LegalOps Backend running ✅";

/// Everything `build_application` needs, loaded by the caller.
pub struct AppOptions<'a> {
    pub router_config: RouterConfig,
    pub identity_provider: Option<FirebaseConfig>,
    pub modules: &'a [RouteModule],
}

/// The assembled application.
pub struct Application {
    router: Router,
    auth_state: AuthState,
    discovery: DiscoveryReport,
}

impl Application {
    /// The auth settings in force, or `None` when authentication is disabled.
    #[must_use]
    pub fn auth_config(&self) -> Option<&AuthConfig> {
        self.auth_state.config()
    }

    #[must_use]
    pub const fn discovery(&self) -> &DiscoveryReport {
        &self.discovery
    }

    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: ROOT_MESSAGE,
    })
}

/// Assemble the application.
pub fn build_application(options: AppOptions<'_>) -> Application {
    let AppOptions {
        router_config,
        identity_provider,
        modules,
    } = options;

    let auth_state = match identity_provider {
        Some(firebase) => {
            tracing::info!(
                "Firebase config found, verifying tokens for project {}",
                firebase.project_id
            );
            AuthState::enabled(Authorizer::new(AuthConfig::for_firebase(&firebase)))
        }
        None => {
            tracing::warn!("No Firebase config found, authentication is disabled");
            AuthState::disabled()
        }
    };

    let discovered = discover_routes(modules, &router_config, &auth_state);
    tracing::info!(
        "Mounted {} route modules ({} skipped)",
        discovered.report.mounted.len(),
        discovered.report.skipped.len()
    );

    let router = Router::new()
        .route("/", get(root))
        .merge(discovered.router);

    Application {
        router,
        auth_state,
        discovery: discovered.report,
    }
}
