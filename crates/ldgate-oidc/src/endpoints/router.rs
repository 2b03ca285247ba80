//! Router assembly.

use axum::routing::{get, post};
use axum::Router;

use super::authorize::{authorize_get, authorize_post};
use super::discovery::{discovery, jwks};
use super::state::AppState;
use super::token::token;
use super::userinfo::{userinfo_get, userinfo_post};

/// Builds the provider router. Paths come from the configuration:
///
/// | Method    | Default path                        | Handler   |
/// |-----------|-------------------------------------|-----------|
/// | GET       | `/.well-known/openid-configuration` | discovery |
/// | GET, POST | `/login`                            | authorize |
/// | POST      | `/login/token`                      | token     |
/// | GET, POST | `/login/userinfo`                   | userinfo  |
/// | GET       | `/login/jwks`                       | jwks      |
#[must_use]
pub fn router(state: AppState) -> Router {
    let paths = state.config.resolved_paths();

    Router::new()
        .route(&paths.discovery, get(discovery))
        .route(
            &paths.authorization,
            get(authorize_get).post(authorize_post),
        )
        .route(&paths.token, post(token))
        .route(&paths.userinfo, get(userinfo_get).post(userinfo_post))
        .route(&paths.jwks, get(jwks))
        .with_state(state)
}
