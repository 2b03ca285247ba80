//! Userinfo endpoint handler.
//!
//! Validates the bearer access token, fetches the subject's attributes from
//! the directory, and returns the scope-projected claim map. The response
//! carries `Access-Control-Allow-Origin` when the token's authorized party
//! has a configured origin.

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};

use crate::authorize::fetch_claims;
use crate::error::OidcError;
use crate::provider::DirectoryError;

use super::state::AppState;

/// GET userinfo endpoint.
pub async fn userinfo_get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    handle(&state, &headers).await
}

/// POST userinfo endpoint. The token still travels in the header.
pub async fn userinfo_post(State(state): State<AppState>, headers: HeaderMap) -> Response {
    handle(&state, &headers).await
}

async fn handle(state: &AppState, headers: &HeaderMap) -> Response {
    let raw = match bearer_token(headers) {
        Some(token) => token,
        None => {
            return unauthorized(
                &OidcError::InvalidToken("missing bearer token".to_string()),
                None,
            )
        }
    };

    let claims = match state.tokens.parse_access_token(raw) {
        Ok(claims) => claims,
        Err(e) => return unauthorized(&OidcError::InvalidToken(e.to_string()), None),
    };

    // The presenting client's configured origin applies from here on.
    let cors = claims
        .azp
        .first()
        .and_then(|azp| state.config.client(azp))
        .and_then(|client| client.cors_origin.clone());

    let scope = claims.scopes().iter().map(ToString::to_string).collect();
    match fetch_claims(state, &scope, &claims.sub).await {
        Ok(info) => with_cors((StatusCode::OK, Json(info)).into_response(), cors.as_deref()),
        Err(DirectoryError::NotFound | DirectoryError::InvalidCredentials) => unauthorized(
            &OidcError::InvalidToken("user was not found or disabled".to_string()),
            cors.as_deref(),
        ),
        Err(DirectoryError::Unavailable(cause)) => {
            tracing::error!(error = %cause, "directory lookup failed");
            let error = OidcError::ServerError("failed to get user info".to_string());
            with_cors(
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error.to_response())).into_response(),
                cors.as_deref(),
            )
        }
    }
}

/// Extracts the bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn unauthorized(error: &OidcError, cors: Option<&str>) -> Response {
    let challenge = format!(
        "Bearer error=\"{}\", error_description=\"{}\"",
        error.error_code(),
        error.to_string().replace('"', "'")
    );
    let response = (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, challenge)],
        Json(error.to_response()),
    )
        .into_response();
    with_cors(response, cors)
}

fn with_cors(mut response: Response, origin: Option<&str>) -> Response {
    if let Some(origin) = origin {
        if let Ok(value) = HeaderValue::from_str(origin) {
            response
                .headers_mut()
                .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
    }
    response
}
