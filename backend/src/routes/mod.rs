//! Route modules and their mounting.
//!
//! Every file in this directory (except `mod.rs` and names starting with `_`)
//! is a route module. `build.rs` turns them into the `ROUTE_MODULES` table, so
//! adding a file is all it takes to add endpoints. A route module exposes:
//!
//! ```ignore
//! pub fn router() -> RouteModuleResult
//! ```
//!
//! returning `Ok(Some(router))` to contribute routes, `Ok(None)` to contribute
//! nothing, or `Err(_)` when it cannot be set up. All accepted routers are
//! mounted under [`ROUTES_PREFIX`]; each is guarded by the authorization
//! dependency unless `routers.json` disables auth for it.
//!
//! # Invariants
//! - One failing module never prevents the others from being mounted. A
//!   module whose `router()` panics, or whose routes clash with a module
//!   mounted before it, is skipped as failed.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use axum::{Router, middleware};

use crate::auth::{AuthState, require_authorized_user, requires_authorization};
use crate::router_config::RouterConfig;

include!(concat!(env!("OUT_DIR"), "/route_modules.rs"));

/// Path all route modules are mounted under.
pub const ROUTES_PREFIX: &str = "/routes";

/// What a route module's `router()` returns.
pub type RouteModuleResult = Result<Option<Router>, RouteModuleError>;

/// A route module: its name and the function building its router.
#[derive(Debug, Clone, Copy)]
pub struct RouteModule {
    pub name: &'static str,
    pub router: fn() -> RouteModuleResult,
}

/// Error returned by a route module that cannot build its router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteModuleError(String);

impl RouteModuleError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for RouteModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RouteModuleError {}

/// Why a route module contributed no routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The module name starts with `_`.
    Private,
    /// The module returned no router, or a router without routes.
    NoRouter,
    /// The module failed to build its router.
    Failed(String),
}

/// A route module that was mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedModule {
    pub name: String,
    pub auth_required: bool,
}

/// A route module that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModule {
    pub name: String,
    pub reason: SkipReason,
}

/// Outcome of route discovery, in module order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub mounted: Vec<MountedModule>,
    pub skipped: Vec<SkippedModule>,
}

impl DiscoveryReport {
    fn skip(&mut self, name: &str, reason: SkipReason) {
        self.skipped.push(SkippedModule {
            name: name.to_string(),
            reason,
        });
    }
}

/// The combined router for all route modules plus what happened to each.
pub struct DiscoveredRoutes {
    pub router: Router,
    pub report: DiscoveryReport,
}

/// The route modules compiled into this binary.
#[must_use]
pub fn registered_modules() -> &'static [RouteModule] {
    ROUTE_MODULES
}

/// Build every module's router and mount the accepted ones under [`ROUTES_PREFIX`].
///
/// Modules that return nothing or fail are logged and skipped.
pub fn discover_routes(
    modules: &[RouteModule],
    router_config: &RouterConfig,
    auth: &AuthState,
) -> DiscoveredRoutes {
    let mut routes = Router::new();
    let mut report = DiscoveryReport::default();

    for module in modules {
        if module.name.starts_with('_') {
            tracing::debug!("Skipping private route module {}", module.name);
            report.skip(module.name, SkipReason::Private);
            continue;
        }

        tracing::info!("Importing route module {}", module.name);
        let router = match build_router(module) {
            Ok(Some(router)) if router.has_routes() => router,
            Ok(_) => {
                tracing::warn!("Route module {} exposes no routes, skipping", module.name);
                report.skip(module.name, SkipReason::NoRouter);
                continue;
            }
            Err(e) => {
                tracing::warn!("Error importing route module {}: {e}", module.name);
                report.skip(module.name, SkipReason::Failed(e.to_string()));
                continue;
            }
        };

        let auth_required = requires_authorization(router_config, module.name);
        let router = if auth_required {
            router.route_layer(middleware::from_fn_with_state(
                auth.clone(),
                require_authorized_user,
            ))
        } else {
            router
        };

        // Keep the routes merged so far when this module clashes with them
        let merged = catch_unwind(AssertUnwindSafe(|| routes.clone().merge(router)));
        routes = match merged {
            Ok(merged) => merged,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::warn!(
                    "Route module {} conflicts with mounted routes: {message}",
                    module.name
                );
                report.skip(module.name, SkipReason::Failed(message));
                continue;
            }
        };
        if !auth_required {
            tracing::info!("Route module {} mounted without authorization", module.name);
        }
        report.mounted.push(MountedModule {
            name: module.name.to_string(),
            auth_required,
        });
    }

    let router = if report.mounted.is_empty() {
        Router::new()
    } else {
        Router::new().nest(ROUTES_PREFIX, routes)
    };

    DiscoveredRoutes { router, report }
}

/// Call a module's `router()`, turning a panic into a module error.
fn build_router(module: &RouteModule) -> RouteModuleResult {
    catch_unwind(module.router)
        .unwrap_or_else(|panic| Err(RouteModuleError::new(panic_message(panic.as_ref()))))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "route module panicked".to_string()
    }
}
