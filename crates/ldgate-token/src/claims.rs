//! Claim sets per token kind.
//!
//! Every kind shares `iss`, `exp`, `iat`, and a `typ` discriminator; the
//! rest differs per kind. Audience is the relying client for codes, access,
//! and ID tokens, and the issuer itself for the SSO cookie.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `typ` claim values, one per token kind.
pub mod typ {
    /// Authorization code.
    pub const CODE: &str = "CODE";
    /// Access token.
    pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
    /// ID token.
    pub const ID_TOKEN: &str = "ID_TOKEN";
    /// SSO cookie token.
    pub const SSO_TOKEN: &str = "SSO_TOKEN";
    /// In-flight authorization request, embedded in the login form.
    pub const LOGIN_SESSION: &str = "LOGIN_SESSION";
}

/// Authorization code claims.
///
/// The code binds the whole authorization request so the token endpoint can
/// verify the exchange without server-side state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeClaims {
    /// Issuer URL.
    pub iss: String,

    /// Authenticated subject.
    pub sub: String,

    /// Client the code was issued to.
    pub aud: String,

    /// Expiry (Unix seconds).
    pub exp: i64,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Token kind discriminator.
    pub typ: String,

    /// Token id, reserved for a server-side consumed-code set.
    pub jti: String,

    /// Granted scopes, space delimited.
    pub scope: String,

    /// When the user actually authenticated (Unix seconds).
    pub auth_time: i64,

    /// Redirect URI the code was issued for; must match at exchange.
    pub redirect_uri: String,

    /// Nonce from the authorization request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// PKCE challenge recorded at authorization time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE challenge method (`S256` or `plain`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
}

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer URL.
    pub iss: String,

    /// Authenticated subject.
    pub sub: String,

    /// Client the token was issued to.
    pub aud: String,

    /// Expiry (Unix seconds).
    pub exp: i64,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Token kind discriminator.
    pub typ: String,

    /// Token id.
    pub jti: String,

    /// Granted scopes, space delimited.
    pub scope: String,

    /// When the user actually authenticated (Unix seconds).
    pub auth_time: i64,

    /// Authorized parties. Drives the userinfo CORS header.
    #[serde(default)]
    pub azp: Vec<String>,
}

impl AccessTokenClaims {
    /// Scopes as a list.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scope.split_whitespace().collect()
    }
}

/// ID token claims.
///
/// Scope-projected claims land in `extra` and serialize flattened next to
/// the standard ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer URL.
    pub iss: String,

    /// Authenticated subject.
    pub sub: String,

    /// Client the token asserts authentication to.
    pub aud: String,

    /// Expiry (Unix seconds).
    pub exp: i64,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Token kind discriminator.
    pub typ: String,

    /// When the user actually authenticated (Unix seconds).
    pub auth_time: i64,

    /// Authorized party.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    /// Nonce echoed from the authorization request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Left-half hash of the access token issued alongside.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,

    /// Left-half hash of the code issued alongside.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_hash: Option<String>,

    /// Scope-projected claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// SSO cookie claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoTokenClaims {
    /// Issuer URL.
    pub iss: String,

    /// Authenticated subject.
    pub sub: String,

    /// The issuer itself; the cookie never leaves the provider.
    pub aud: String,

    /// Expiry (Unix seconds).
    pub exp: i64,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Token kind discriminator.
    pub typ: String,

    /// Token id.
    pub jti: String,

    /// When the user originally authenticated (Unix seconds).
    pub auth_time: i64,

    /// Clients this session has authenticated to.
    #[serde(default)]
    pub azp: Vec<String>,
}

impl SsoTokenClaims {
    /// Whether the session already covers a client.
    #[must_use]
    pub fn authorized_for(&self, client_id: &str) -> bool {
        self.azp.iter().any(|c| c == client_id)
    }
}
