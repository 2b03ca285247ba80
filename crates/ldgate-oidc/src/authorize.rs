//! Response composition for the authorization endpoint.
//!
//! Once a request is validated and the user is authenticated, this module
//! mints the requested artifacts (code, access token, ID token), refreshes
//! the SSO token, and builds the redirect URL with results placed in the
//! query or the fragment.

use chrono::Utc;

use ldgate_token::{left_half_hash, NewCode, NewIdToken};

use crate::endpoints::state::AppState;
use crate::error::OidcError;
use crate::provider::DirectoryError;
use crate::request::AuthorizeRequest;
use crate::types::ResponseMode;

/// An authenticated principal, from credentials or from a reused session.
#[derive(Debug, Clone)]
pub struct AuthorizedSession {
    /// Subject identifier.
    pub subject: String,

    /// When the user actually authenticated.
    pub auth_time: i64,

    /// Clients the refreshed SSO token will cover (already unioned with
    /// the requesting client).
    pub sso_clients: Vec<String>,
}

impl AuthorizedSession {
    /// A session freshly established by a credential check.
    #[must_use]
    pub fn fresh(subject: &str, previous_clients: Vec<String>, client_id: &str) -> Self {
        Self {
            subject: subject.to_string(),
            auth_time: Utc::now().timestamp(),
            sso_clients: union_client(previous_clients, client_id),
        }
    }

    /// A session reused from a valid SSO token.
    #[must_use]
    pub fn reused(subject: &str, auth_time: i64, clients: Vec<String>, client_id: &str) -> Self {
        Self {
            subject: subject.to_string(),
            auth_time,
            sso_clients: union_client(clients, client_id),
        }
    }
}

fn union_client(mut clients: Vec<String>, client_id: &str) -> Vec<String> {
    if !clients.iter().any(|c| c == client_id) {
        clients.push(client_id.to_string());
    }
    clients
}

/// The composed success response.
#[derive(Debug)]
pub struct Composition {
    /// Full redirect URL with result parameters in place.
    pub redirect_url: String,

    /// Refreshed SSO token for the cookie.
    pub sso_token: String,
}

/// Mints the artifacts requested by `response_type` and builds the redirect.
///
/// # Errors
///
/// Returns `server_error` on signing or directory failures; the cause is
/// logged, never leaked.
pub async fn compose(
    state: &AppState,
    req: &AuthorizeRequest,
    session: &AuthorizedSession,
) -> Result<Composition, OidcError> {
    let tokens = &state.tokens;
    let scope = req.scope_str();
    let mut params: Vec<(String, String)> = Vec::new();

    let code = if req.response_type.has_code() {
        let code = tokens
            .create_code(&NewCode {
                subject: &session.subject,
                client_id: &req.client_id,
                scope: &scope,
                redirect_uri: &req.redirect_uri,
                nonce: req.nonce.as_deref(),
                code_challenge: req.code_challenge.as_deref(),
                code_challenge_method: req.code_challenge_method.map(|m| m.as_str()),
                auth_time: session.auth_time,
            })
            .map_err(|e| signing_failure("authorization code", &e))?;
        params.push(("code".to_string(), code.clone()));
        Some(code)
    } else {
        None
    };

    let access_token = if req.response_type.has_token() {
        let token = tokens
            .create_access_token(&session.subject, &req.client_id, &scope, session.auth_time)
            .map_err(|e| signing_failure("access token", &e))?;
        params.push(("access_token".to_string(), token.clone()));
        params.push(("token_type".to_string(), "Bearer".to_string()));
        params.push((
            "expires_in".to_string(),
            tokens.access_ttl_secs().to_string(),
        ));
        Some(token)
    } else {
        None
    };

    if req.response_type.has_id_token() {
        // Claims may be deferred to userinfo when an access token travels
        // alongside the ID token.
        let extra = if access_token.is_some() {
            serde_json::Map::new()
        } else {
            let mut claims = fetch_claims(state, &req.scope, &session.subject)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "claim projection failed");
                    OidcError::ServerError("failed to get user info".to_string())
                })?;
            claims.remove("sub");
            claims
        };

        let id_token = tokens
            .create_id_token(NewIdToken {
                subject: &session.subject,
                client_id: &req.client_id,
                nonce: req.nonce.as_deref(),
                auth_time: session.auth_time,
                at_hash: access_token.as_deref().map(left_half_hash),
                c_hash: code.as_deref().map(left_half_hash),
                extra,
            })
            .map_err(|e| signing_failure("ID token", &e))?;
        params.push(("id_token".to_string(), id_token));
    }

    if let Some(state_value) = &req.state {
        params.push(("state".to_string(), state_value.clone()));
    }

    let sso_token = tokens
        .create_sso_token(
            &session.subject,
            session.auth_time,
            session.sso_clients.clone(),
        )
        .map_err(|e| signing_failure("SSO token", &e))?;

    Ok(Composition {
        redirect_url: build_redirect_url(&req.redirect_uri, &params, req.response_mode),
        sso_token,
    })
}

/// Projects scope claims for a subject by asking the directory.
///
/// Error mapping is left to the caller: the same lookup failure surfaces as
/// `server_error` at the authorization endpoint, `invalid_grant` at the
/// token endpoint, and `invalid_token` at userinfo.
///
/// # Errors
///
/// Returns the directory failure unchanged.
pub async fn fetch_claims(
    state: &AppState,
    scope: &std::collections::BTreeSet<String>,
    subject: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, DirectoryError> {
    let attributes = state.config.scopes.attributes_for(scope);
    let values = state.directory.user_attributes(subject, &attributes).await?;
    Ok(state.config.scopes.claims_for(scope, &values, subject))
}

fn signing_failure(what: &str, err: &ldgate_token::TokenError) -> OidcError {
    tracing::error!(error = %err, "failed to sign {what}");
    OidcError::ServerError("failed to issue tokens".to_string())
}

/// Appends parameters to a redirect URI in the query or the fragment.
#[must_use]
pub fn build_redirect_url(
    redirect_uri: &str,
    params: &[(String, String)],
    mode: ResponseMode,
) -> String {
    let encoded: String = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    match mode {
        ResponseMode::Query => {
            let separator = if redirect_uri.contains('?') { "&" } else { "?" };
            format!("{redirect_uri}{separator}{encoded}")
        }
        ResponseMode::Fragment => format!("{redirect_uri}#{encoded}"),
    }
}

/// Builds an error redirect URL with `error`, `error_description`, and the
/// echoed `state`.
#[must_use]
pub fn error_redirect_url(
    redirect_uri: &str,
    error: &OidcError,
    state: Option<&str>,
    mode: ResponseMode,
) -> String {
    let mut params = vec![
        ("error".to_string(), error.error_code().to_string()),
        ("error_description".to_string(), error.to_string()),
    ];
    if let Some(state) = state {
        params.push(("state".to_string(), state.to_string()));
    }
    build_redirect_url(redirect_uri, &params, mode)
}
