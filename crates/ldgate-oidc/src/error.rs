//! Protocol error types, aligned with RFC 6749 and OpenID Connect Core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol errors surfaced to relying parties.
#[derive(Debug, Error)]
pub enum OidcError {
    /// Malformed or inconsistent request parameters.
    #[error("{0}")]
    InvalidRequest(String),

    /// Client authentication failed at the token endpoint.
    #[error("{0}")]
    InvalidClient(String),

    /// Invalid or expired authorization grant.
    #[error("{0}")]
    InvalidGrant(String),

    /// The client is not registered or may not use this flow.
    #[error("{0}")]
    UnauthorizedClient(String),

    /// The token endpoint does not support this grant type.
    #[error("{0}")]
    UnsupportedGrantType(String),

    /// Unknown scope, or `openid` missing.
    #[error("{0}")]
    InvalidScope(String),

    /// `response_type` outside `code`/`token`/`id_token`.
    #[error("{0}")]
    UnsupportedResponseType(String),

    /// The resource owner denied the request.
    #[error("{0}")]
    AccessDenied(String),

    /// A presented token failed validation.
    #[error("{0}")]
    InvalidToken(String),

    /// Internal failure. The description never carries the cause.
    #[error("{0}")]
    ServerError(String),

    /// `prompt=none` with no reusable session.
    #[error("user authentication is required")]
    LoginRequired,

    /// `prompt=none` for a client the session has not been used with.
    #[error("user consent is required")]
    ConsentRequired,

    /// `prompt=none` but some interaction would be needed.
    #[error("user interaction is required")]
    InteractionRequired,
}

impl OidcError {
    /// The OAuth 2.0 error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnauthorizedClient(_) => "unauthorized_client",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::InvalidScope(_) => "invalid_scope",
            Self::UnsupportedResponseType(_) => "unsupported_response_type",
            Self::AccessDenied(_) => "access_denied",
            Self::InvalidToken(_) => "invalid_token",
            Self::ServerError(_) => "server_error",
            Self::LoginRequired => "login_required",
            Self::ConsentRequired => "consent_required",
            Self::InteractionRequired => "interaction_required",
        }
    }

    /// The HTTP status used when the error is answered directly.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidGrant(_)
            | Self::UnsupportedGrantType(_)
            | Self::InvalidScope(_)
            | Self::UnsupportedResponseType(_)
            | Self::LoginRequired
            | Self::ConsentRequired
            | Self::InteractionRequired => 400,
            Self::InvalidClient(_) | Self::InvalidToken(_) => 401,
            Self::AccessDenied(_) | Self::UnauthorizedClient(_) => 403,
            Self::ServerError(_) => 500,
        }
    }

    /// The machine-readable response body.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_code().to_string(),
            error_description: Some(self.to_string()),
        }
    }
}

/// OAuth 2.0 error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,

    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Result type for protocol operations.
pub type OidcResult<T> = Result<T, OidcError>;
