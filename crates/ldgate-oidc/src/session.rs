//! The login-session token.
//!
//! The authorize GET renders a login form; the in-flight authorization
//! request travels to the credential POST as a signed opaque token in a
//! hidden form field. This keeps the state machine stateless at the request
//! boundary: no server-side session storage exists.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use ldgate_token::{typ, TokenError, TokenManager};

use crate::request::AuthorizeParams;

/// Claims of the login-session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSessionClaims {
    /// Issuer URL.
    pub iss: String,

    /// The issuer itself; the token never leaves the provider.
    pub aud: String,

    /// Expiry (Unix seconds). Uses the authorization code lifetime.
    pub exp: i64,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Token kind discriminator.
    pub typ: String,

    /// The preserved authorization request.
    pub request: AuthorizeParams,
}

/// Wraps an in-flight authorization request into a signed token.
///
/// # Errors
///
/// Returns an error if signing fails.
pub fn create_login_session(
    tokens: &TokenManager,
    params: &AuthorizeParams,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = LoginSessionClaims {
        iss: tokens.issuer().to_string(),
        aud: tokens.issuer().to_string(),
        exp: (now + tokens.code_ttl()).timestamp(),
        iat: now.timestamp(),
        typ: typ::LOGIN_SESSION.to_string(),
        request: params.clone(),
    };
    tokens.sign(&claims)
}

/// Unwraps and validates a login-session token.
///
/// # Errors
///
/// Returns the first failed check, including a `typ` or audience mismatch.
pub fn parse_login_session(
    tokens: &TokenManager,
    raw: &str,
) -> Result<AuthorizeParams, TokenError> {
    let claims: LoginSessionClaims = tokens.verify(raw)?;
    if claims.typ != typ::LOGIN_SESSION {
        return Err(TokenError::WrongType {
            expected: typ::LOGIN_SESSION,
            got: claims.typ,
        });
    }
    if claims.aud != tokens.issuer() {
        return Err(TokenError::UnexpectedAudience);
    }
    Ok(claims.request)
}
