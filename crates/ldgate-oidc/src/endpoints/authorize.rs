//! Authorization endpoint handler.
//!
//! Drives one authorize transaction through parse, validation, SSO reuse or
//! the login form, response composition, and the final redirect. GET and
//! POST are both accepted; a POST carrying a `session` field is a login-form
//! submission, everything else is a fresh authorization request.

use axum::extract::{RawForm, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use cookie::time::Duration as CookieDuration;

use crate::authorize::{compose, error_redirect_url, AuthorizedSession};
use crate::error::OidcError;
use crate::provider::DirectoryError;
use crate::request::{self, AuthorizeParams, AuthorizeRequest, RejectedRequest};
use crate::session;

use super::state::AppState;

/// Name of the SSO cookie.
pub const SSO_COOKIE: &str = "ldgate_sso";

/// GET authorization endpoint.
pub async fn authorize_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    let pairs = parse_pairs(query.as_deref());
    handle(&state, &headers, jar, pairs).await
}

/// POST authorization endpoint.
///
/// Query and form parameters are merged; form fields win on duplicates.
pub async fn authorize_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    RawQuery(query): RawQuery,
    RawForm(body): RawForm,
) -> Response {
    let mut pairs = parse_pairs(query.as_deref());
    pairs.extend(parse_pairs(std::str::from_utf8(&body).ok()));
    handle(&state, &headers, jar, pairs).await
}

fn parse_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.and_then(|s| serde_urlencoded::from_str::<Vec<(String, String)>>(s).ok())
        .unwrap_or_default()
}

fn find<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    // Last occurrence wins, matching the merge precedence.
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

async fn handle(
    state: &AppState,
    headers: &HeaderMap,
    jar: CookieJar,
    pairs: Vec<(String, String)>,
) -> Response {
    if find(&pairs, "session").is_some() {
        handle_login_submit(state, headers, jar, &pairs).await
    } else {
        handle_authorize(state, headers, jar, &pairs).await
    }
}

/// A fresh authorization request: validate, try SSO, or show the login form.
async fn handle_authorize(
    state: &AppState,
    headers: &HeaderMap,
    jar: CookieJar,
    pairs: &[(String, String)],
) -> Response {
    let params = AuthorizeParams::from_pairs(pairs.iter().cloned());
    let req = match request::validate(&params, &state.config) {
        Ok(req) => req,
        Err(rejected) => return rejected_response(headers, &rejected),
    };

    let sso = jar
        .get(SSO_COOKIE)
        .and_then(|cookie| state.tokens.parse_sso_token(cookie.value()).ok());

    if let Some(sso) = &sso {
        let fresh_enough = req
            .max_age
            .map_or(true, |max_age| Utc::now().timestamp() - sso.auth_time <= max_age);
        // Silent reuse needs an interactive-capable request, or a session
        // that has already covered this client when no UI may be shown.
        let reusable = !req.prompt.has_login()
            && fresh_enough
            && (!req.prompt.has_none() || sso.authorized_for(&req.client_id));

        if reusable {
            let session =
                AuthorizedSession::reused(&sso.sub, sso.auth_time, sso.azp.clone(), &req.client_id);
            return success_response(state, jar, &req, &session).await;
        }
    }

    if req.prompt.has_none() {
        return redirect_error(&req, &OidcError::LoginRequired);
    }

    match session::create_login_session(&state.tokens, &params) {
        Ok(token) => login_form(
            state,
            &token,
            req.login_hint.as_deref(),
            None,
            StatusCode::OK,
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to sign login session");
            redirect_error(&req, &OidcError::ServerError("failed to issue tokens".to_string()))
        }
    }
}

/// A login-form submission: recover the request, verify credentials once.
async fn handle_login_submit(
    state: &AppState,
    headers: &HeaderMap,
    jar: CookieJar,
    pairs: &[(String, String)],
) -> Response {
    let session_raw = find(pairs, "session").unwrap_or_default();
    let params = match session::parse_login_session(&state.tokens, session_raw) {
        Ok(params) => params,
        Err(_) => {
            return direct_error(
                headers,
                &OidcError::InvalidRequest("login session is invalid or expired".to_string()),
            )
        }
    };

    let req = match request::validate(&params, &state.config) {
        Ok(req) => req,
        Err(rejected) => return rejected_response(headers, &rejected),
    };

    let username = find(pairs, "username").unwrap_or_default();
    let password = find(pairs, "password").unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return login_form(
            state,
            session_raw,
            Some(username),
            Some("username and password are required"),
            StatusCode::BAD_REQUEST,
        );
    }

    match state.directory.authenticate(username, password).await {
        Ok(()) => {
            let previous = jar
                .get(SSO_COOKIE)
                .and_then(|cookie| state.tokens.parse_sso_token(cookie.value()).ok())
                .map(|sso| sso.azp)
                .unwrap_or_default();
            let session = AuthorizedSession::fresh(username, previous, &req.client_id);
            success_response(state, jar, &req, &session).await
        }
        Err(DirectoryError::InvalidCredentials | DirectoryError::NotFound) => login_form(
            state,
            session_raw,
            Some(username),
            Some("invalid username or password"),
            StatusCode::FORBIDDEN,
        ),
        Err(DirectoryError::Unavailable(cause)) => {
            tracing::error!(error = %cause, "credential check failed");
            redirect_error(&req, &OidcError::ServerError("authentication failed".to_string()))
        }
    }
}

/// Composes the artifacts, refreshes the SSO cookie, and redirects.
async fn success_response(
    state: &AppState,
    jar: CookieJar,
    req: &AuthorizeRequest,
    session: &AuthorizedSession,
) -> Response {
    match compose(state, req, session).await {
        Ok(composition) => {
            let jar = jar.add(sso_cookie(state, composition.sso_token));
            (jar, found(&composition.redirect_url)).into_response()
        }
        Err(error) => redirect_error(req, &error),
    }
}

fn redirect_error(req: &AuthorizeRequest, error: &OidcError) -> Response {
    let url = error_redirect_url(
        &req.redirect_uri,
        error,
        req.state.as_deref(),
        req.response_mode,
    );
    found(&url)
}

/// A plain 302 redirect; results and errors alike travel as a Found.
fn found(url: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
}

fn rejected_response(headers: &HeaderMap, rejected: &RejectedRequest) -> Response {
    match rejected {
        RejectedRequest::Direct(error) => direct_error(headers, error),
        RejectedRequest::Redirect {
            redirect_uri,
            response_mode,
            state,
            error,
        } => {
            let url = error_redirect_url(redirect_uri, error, state.as_deref(), *response_mode);
            found(&url)
        }
    }
}

/// Answers an error directly, HTML or JSON by `Accept`. Used only while the
/// redirect target is unverified.
fn direct_error(headers: &HeaderMap, error: &OidcError) -> Response {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if wants_json(headers) {
        return (status, Json(error.to_response())).into_response();
    }

    let html = format!(
        r"<!DOCTYPE html>
<html>
<head><title>Authorization Error</title></head>
<body>
<h1>Authorization Error</h1>
<p><strong>Error:</strong> {}</p>
<p><strong>Description:</strong> {}</p>
</body>
</html>",
        html_escape(error.error_code()),
        html_escape(&error.to_string())
    );
    (status, Html(html)).into_response()
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// Renders the login form with the request preserved in a hidden field.
fn login_form(
    state: &AppState,
    session_token: &str,
    username: Option<&str>,
    error: Option<&str>,
    status: StatusCode,
) -> Response {
    let action = state.config.resolved_paths().authorization;
    let message = error.map_or(String::new(), |msg| {
        format!("<p class=\"error\">{}</p>\n", html_escape(msg))
    });

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
<h1>Sign in</h1>
{message}<form method="post" action="{action}">
<input type="hidden" name="session" value="{session}" />
<label>Username <input type="text" name="username" value="{username}" autofocus /></label>
<label>Password <input type="password" name="password" /></label>
<button type="submit">Sign in</button>
</form>
</body>
</html>"#,
        message = message,
        action = html_escape(&action),
        session = html_escape(session_token),
        username = html_escape(username.unwrap_or_default()),
    );

    (status, Html(html)).into_response()
}

fn sso_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SSO_COOKIE, token))
        .path(state.config.issuer_path())
        .http_only(true)
        .max_age(CookieDuration::seconds(state.tokens.sso_ttl_secs()))
        .build()
}

/// Minimal HTML escaping for the few interpolated values.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
