//! Per-module authorization decision.
//!
//! Every route module requires authorization unless `routers.json`
//! explicitly names it with `disableAuth: true`.

use crate::router_config::RouterConfig;

/// Whether routes from `module_name` must pass the authorization dependency.
#[must_use]
pub fn requires_authorization(router_config: &RouterConfig, module_name: &str) -> bool {
    !router_config.is_auth_disabled(module_name)
}
