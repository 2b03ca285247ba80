//! Token endpoint handler.
//!
//! Exchanges an authorization code for an access token and an ID token.
//! The code carries the whole authorization context, so the exchange
//! validates against the code itself: audience, redirect URI, and the PKCE
//! challenge when one was recorded.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::Form;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use ldgate_token::{left_half_hash, s256_hash, CodeClaims, NewIdToken, TokenError};

use crate::authorize::fetch_claims;
use crate::error::OidcError;
use crate::provider::DirectoryError;

use super::state::AppState;

/// Form body of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    /// Must be `authorization_code`.
    pub grant_type: Option<String>,

    /// The authorization code.
    pub code: Option<String>,

    /// Redirect URI the code was issued for.
    pub redirect_uri: Option<String>,

    /// Exchanging client.
    pub client_id: Option<String>,

    /// Client secret, when client authentication is enabled.
    pub client_secret: Option<String>,

    /// PKCE code verifier.
    pub code_verifier: Option<String>,
}

/// Success body of the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer access token.
    pub access_token: String,

    /// Always `Bearer`.
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: i64,

    /// ID token.
    pub id_token: String,

    /// Granted scopes, space delimited.
    pub scope: String,
}

/// POST token endpoint.
pub async fn token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(request): Form<TokenRequest>,
) -> Response {
    match handle(&state, &headers, &request).await {
        Ok(response) => (
            StatusCode::OK,
            [
                (header::CACHE_CONTROL, "no-store"),
                (header::PRAGMA, "no-cache"),
            ],
            Json(response),
        )
            .into_response(),
        Err(ref error) => error_response(error),
    }
}

async fn handle(
    state: &AppState,
    headers: &HeaderMap,
    request: &TokenRequest,
) -> Result<TokenResponse, OidcError> {
    match request.grant_type.as_deref() {
        None => {
            return Err(OidcError::InvalidRequest(
                "grant_type is required".to_string(),
            ))
        }
        Some("authorization_code") => {}
        Some(other) => return Err(OidcError::UnsupportedGrantType(other.to_string())),
    }

    let (client_id, client_secret) = client_credentials(headers, request)?;

    let raw_code = request
        .code
        .as_deref()
        .ok_or_else(|| OidcError::InvalidRequest("code is required".to_string()))?;

    let code = state.tokens.parse_code(raw_code).map_err(code_error)?;

    if code.aud != client_id {
        return Err(OidcError::InvalidGrant(
            "code was not issued to this client".to_string(),
        ));
    }

    if state.config.enable_client_auth {
        verify_client_secret(state, &client_id, client_secret.as_deref())?;
    }

    match request.redirect_uri.as_deref() {
        Some(uri) if uri == code.redirect_uri => {}
        Some(_) => {
            return Err(OidcError::InvalidGrant(
                "redirect_uri does not match the authorization request".to_string(),
            ))
        }
        None => {
            return Err(OidcError::InvalidRequest(
                "redirect_uri is required".to_string(),
            ))
        }
    }

    verify_pkce(&code, request.code_verifier.as_deref())?;

    issue_tokens(state, &code).await
}

/// Mints the access token and the ID token for a validated exchange.
async fn issue_tokens(state: &AppState, code: &CodeClaims) -> Result<TokenResponse, OidcError> {
    let access_token = state
        .tokens
        .create_access_token(&code.sub, &code.aud, &code.scope, code.auth_time)
        .map_err(|e| {
            tracing::error!(error = %e, "failed to sign access token");
            OidcError::ServerError("failed to issue tokens".to_string())
        })?;

    let scope_set = code.scope.split_whitespace().map(ToString::to_string).collect();
    let mut extra = fetch_claims(state, &scope_set, &code.sub)
        .await
        .map_err(|e| match e {
            DirectoryError::NotFound | DirectoryError::InvalidCredentials => {
                OidcError::InvalidGrant("user was not found or disabled".to_string())
            }
            DirectoryError::Unavailable(cause) => {
                tracing::error!(error = %cause, "directory lookup failed");
                OidcError::ServerError("failed to get user info".to_string())
            }
        })?;
    extra.remove("sub");

    let id_token = state
        .tokens
        .create_id_token(NewIdToken {
            subject: &code.sub,
            client_id: &code.aud,
            nonce: code.nonce.as_deref(),
            auth_time: code.auth_time,
            at_hash: Some(left_half_hash(&access_token)),
            c_hash: None,
            extra,
        })
        .map_err(|e| {
            tracing::error!(error = %e, "failed to sign ID token");
            OidcError::ServerError("failed to issue tokens".to_string())
        })?;

    Ok(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.access_ttl_secs(),
        id_token,
        scope: code.scope.clone(),
    })
}

/// Extracts client credentials from Basic auth or the form body.
fn client_credentials(
    headers: &HeaderMap,
    request: &TokenRequest,
) -> Result<(String, Option<String>), OidcError> {
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        let auth = auth
            .to_str()
            .map_err(|_| OidcError::InvalidClient("invalid authorization header".to_string()))?;

        if let Some(basic) = auth.strip_prefix("Basic ") {
            let decoded = STANDARD
                .decode(basic.trim())
                .map_err(|_| OidcError::InvalidClient("invalid basic auth encoding".to_string()))?;
            let credentials = String::from_utf8(decoded)
                .map_err(|_| OidcError::InvalidClient("invalid basic auth encoding".to_string()))?;
            let (client_id, client_secret) = credentials.split_once(':').ok_or_else(|| {
                OidcError::InvalidClient("invalid basic auth format".to_string())
            })?;

            return Ok((client_id.to_string(), Some(client_secret.to_string())));
        }
    }

    let client_id = request
        .client_id
        .clone()
        .ok_or_else(|| OidcError::InvalidRequest("client_id is required".to_string()))?;
    Ok((client_id, request.client_secret.clone()))
}

fn verify_client_secret(
    state: &AppState,
    client_id: &str,
    client_secret: Option<&str>,
) -> Result<(), OidcError> {
    let client = state
        .config
        .client(client_id)
        .ok_or_else(|| OidcError::InvalidClient("unknown client".to_string()))?;

    match client_secret {
        Some(secret) if secret == client.secret => Ok(()),
        Some(_) => Err(OidcError::InvalidClient(
            "client authentication failed".to_string(),
        )),
        None => Err(OidcError::InvalidClient(
            "client_secret is required".to_string(),
        )),
    }
}

/// Checks the code verifier against the challenge recorded in the code.
fn verify_pkce(code: &CodeClaims, verifier: Option<&str>) -> Result<(), OidcError> {
    let Some(challenge) = code.code_challenge.as_deref() else {
        return Ok(());
    };

    let verifier = verifier.ok_or_else(|| {
        OidcError::InvalidRequest("code_verifier is required".to_string())
    })?;

    let derived = match code.code_challenge_method.as_deref() {
        Some("S256") => s256_hash(verifier),
        _ => verifier.to_string(),
    };

    if derived == challenge {
        Ok(())
    } else {
        Err(OidcError::InvalidGrant(
            "code_verifier does not match the code challenge".to_string(),
        ))
    }
}

fn code_error(err: TokenError) -> OidcError {
    match err {
        TokenError::Expired => OidcError::InvalidGrant("code is expired".to_string()),
        other => OidcError::InvalidGrant(format!("invalid code: {other}")),
    }
}

fn error_response(error: &OidcError) -> Response {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(error.to_response())).into_response()
}
