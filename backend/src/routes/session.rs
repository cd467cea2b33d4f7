//! The signed-in user's session.

use axum::{Json, Router, routing::get};

use crate::auth::AuthorizedUser;
use crate::routes::RouteModuleResult;

pub fn router() -> RouteModuleResult {
    Ok(Some(Router::new().route("/session", get(current_session))))
}

async fn current_session(user: AuthorizedUser) -> Json<AuthorizedUser> {
    Json(user)
}
