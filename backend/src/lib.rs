// Startup sequence:
// 1. Load process config from the environment
// 2. Load routers.json (empty on any failure)
// 3. Resolve the Firebase config from the extension descriptors
// 4. Build the application:
//     - `GET /` liveness
//     - every route module under /routes, guarded unless disableAuth
//     - auth state from the Firebase config, or disabled
// 5. Serve

pub mod app;
pub mod auth;
pub mod config;
pub mod extensions;
pub mod router_config;
pub mod routes;
#[cfg(test)]
mod testing;

pub use app::{AppOptions, Application, build_application};
