//! Authorization request parsing and validation.
//!
//! Validation applies in a fixed order and stops at the first failure.
//! Failures up to and including the `redirect_uri` check must never
//! redirect: an unverified redirect target is unsafe. Everything after is
//! reported to the client on the redirect URI, in the query or fragment per
//! the resolved response mode.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ldgate_core::AppConfig;

use crate::error::OidcError;
use crate::types::{CodeChallengeMethod, PromptSet, ResponseMode, ResponseTypeSet};

/// Raw authorization parameters, as merged from query and form.
///
/// This is also the payload preserved inside the login-session token, so a
/// credential POST revalidates exactly what the initial GET carried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizeParams {
    /// `client_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// `redirect_uri`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// `response_type`, whitespace separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,

    /// `response_mode`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mode: Option<String>,

    /// `scope`, whitespace separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// `state`, echoed byte for byte.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// `nonce`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// `prompt`, whitespace separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// `display`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// `max_age`, seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<String>,

    /// `ui_locales`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_locales: Option<String>,

    /// `id_token_hint`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_hint: Option<String>,

    /// `login_hint`, prefilled into the login form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_hint: Option<String>,

    /// PKCE `code_challenge`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE `code_challenge_method`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
}

impl AuthorizeParams {
    /// Builds parameters from merged key/value pairs. Later occurrences of
    /// a key overwrite earlier ones, which gives form fields precedence
    /// when the caller appends them after the query pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "client_id" => params.client_id = Some(value),
                "redirect_uri" => params.redirect_uri = Some(value),
                "response_type" => params.response_type = Some(value),
                "response_mode" => params.response_mode = Some(value),
                "scope" => params.scope = Some(value),
                "state" => params.state = Some(value),
                "nonce" => params.nonce = Some(value),
                "prompt" => params.prompt = Some(value),
                "display" => params.display = Some(value),
                "max_age" => params.max_age = Some(value),
                "ui_locales" => params.ui_locales = Some(value),
                "id_token_hint" => params.id_token_hint = Some(value),
                "login_hint" => params.login_hint = Some(value),
                "code_challenge" => params.code_challenge = Some(value),
                "code_challenge_method" => params.code_challenge_method = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// A fully validated authorization request.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    /// Registered client.
    pub client_id: String,

    /// Verified redirect URI.
    pub redirect_uri: String,

    /// Requested response types.
    pub response_type: ResponseTypeSet,

    /// Resolved response mode.
    pub response_mode: ResponseMode,

    /// Requested scopes. Always contains `openid`.
    pub scope: BTreeSet<String>,

    /// `state` to echo.
    pub state: Option<String>,

    /// `nonce` to embed in the ID token.
    pub nonce: Option<String>,

    /// Prompt set.
    pub prompt: PromptSet,

    /// Maximum acceptable authentication age, seconds.
    pub max_age: Option<i64>,

    /// Login name hint for the form.
    pub login_hint: Option<String>,

    /// PKCE challenge.
    pub code_challenge: Option<String>,

    /// PKCE challenge method. Defaults to `plain` when a challenge is set.
    pub code_challenge_method: Option<CodeChallengeMethod>,
}

impl AuthorizeRequest {
    /// Scopes as a normalized space-delimited string.
    #[must_use]
    pub fn scope_str(&self) -> String {
        self.scope
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A rejected authorization request.
#[derive(Debug)]
pub enum RejectedRequest {
    /// The redirect target could not be verified; answer directly.
    Direct(OidcError),

    /// The redirect target is verified; report on it.
    Redirect {
        /// Where to send the error.
        redirect_uri: String,
        /// Placement of the error parameters.
        response_mode: ResponseMode,
        /// `state` to echo.
        state: Option<String>,
        /// The error itself.
        error: OidcError,
    },
}

/// Validates raw parameters against the configuration.
///
/// # Errors
///
/// Returns the first failed check, tagged with whether a redirect back to
/// the client is safe.
pub fn validate(
    params: &AuthorizeParams,
    config: &AppConfig,
) -> Result<AuthorizeRequest, RejectedRequest> {
    // Everything up to the redirect_uri check answers directly.
    let client_id = match params.client_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Err(RejectedRequest::Direct(OidcError::InvalidRequest(
                "client_id is required".to_string(),
            )))
        }
    };

    let client = config.client(client_id).ok_or_else(|| {
        RejectedRequest::Direct(OidcError::UnauthorizedClient(
            "client_id is not registered".to_string(),
        ))
    })?;

    let redirect_uri = match params.redirect_uri.as_deref() {
        Some(uri) if !uri.is_empty() => uri,
        _ => {
            return Err(RejectedRequest::Direct(OidcError::InvalidRequest(
                "redirect_uri is required".to_string(),
            )))
        }
    };

    if !client.redirect_allowed(redirect_uri) {
        return Err(RejectedRequest::Direct(OidcError::InvalidRequest(
            "redirect_uri is not registered for this client".to_string(),
        )));
    }

    // The redirect target is verified; later failures report on it.
    let raw_response_type = params.response_type.as_deref().unwrap_or("");
    let default_mode = ResponseMode::default_for(raw_response_type);
    let state = params.state.clone();

    let reject = |error: OidcError, mode: ResponseMode| RejectedRequest::Redirect {
        redirect_uri: redirect_uri.to_string(),
        response_mode: mode,
        state: state.clone(),
        error,
    };

    let response_mode = match params.response_mode.as_deref() {
        None => default_mode,
        Some(raw) => match ResponseMode::from_str(raw) {
            Ok(mode) => mode,
            Err(e) => return Err(reject(OidcError::InvalidRequest(e), default_mode)),
        },
    };

    if raw_response_type.trim().is_empty() {
        return Err(reject(
            OidcError::InvalidRequest("response_type is required".to_string()),
            response_mode,
        ));
    }
    let response_type = match ResponseTypeSet::from_str(raw_response_type) {
        Ok(set) => set,
        Err(e) => return Err(reject(OidcError::UnsupportedResponseType(e), response_mode)),
    };

    let scope: BTreeSet<String> = params
        .scope
        .as_deref()
        .unwrap_or("")
        .split_whitespace()
        .map(ToString::to_string)
        .collect();
    if !scope.contains("openid") {
        return Err(reject(
            OidcError::InvalidScope("scope must contain openid".to_string()),
            response_mode,
        ));
    }
    for s in &scope {
        if !config.scopes.is_known(s) {
            return Err(reject(
                OidcError::InvalidScope(format!("unknown scope: {s}")),
                response_mode,
            ));
        }
    }

    let prompt = PromptSet::parse(params.prompt.as_deref().unwrap_or(""));
    if prompt.none_conflicts() {
        return Err(reject(
            OidcError::InvalidRequest(
                "prompt=none cannot be combined with other values".to_string(),
            ),
            response_mode,
        ));
    }

    if let Some(display) = params.display.as_deref() {
        if display != "page" {
            return Err(reject(
                OidcError::InvalidRequest(format!("unsupported display value: {display}")),
                response_mode,
            ));
        }
    }

    let max_age = match params.max_age.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(v) => Some(v),
            Err(_) => {
                return Err(reject(
                    OidcError::InvalidRequest("max_age must be an integer".to_string()),
                    response_mode,
                ))
            }
        },
    };

    let code_challenge_method = match params.code_challenge_method.as_deref() {
        Some(raw) => match CodeChallengeMethod::from_str(raw) {
            Ok(method) => {
                if params.code_challenge.is_none() {
                    return Err(reject(
                        OidcError::InvalidRequest(
                            "code_challenge_method requires code_challenge".to_string(),
                        ),
                        response_mode,
                    ));
                }
                Some(method)
            }
            Err(e) => return Err(reject(OidcError::InvalidRequest(e), response_mode)),
        },
        None => params.code_challenge.as_ref().map(|_| CodeChallengeMethod::Plain),
    };

    Ok(AuthorizeRequest {
        client_id: client_id.to_string(),
        redirect_uri: redirect_uri.to_string(),
        response_type,
        response_mode,
        scope,
        state,
        nonce: params.nonce.clone(),
        prompt,
        max_age,
        login_hint: params.login_hint.clone(),
        code_challenge: params.code_challenge.clone(),
        code_challenge_method,
    })
}
