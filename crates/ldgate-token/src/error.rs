//! Token subsystem errors.

use thiserror::Error;

/// Errors raised while minting or validating tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Key generation, loading, or persistence failed.
    #[error("key error: {0}")]
    Key(String),

    /// Signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),

    /// The signature did not verify against the current key.
    #[error("invalid token signature")]
    Signature,

    /// The token is not a structurally valid JWT for the expected claims.
    #[error("malformed token: {0}")]
    Format(String),

    /// The `kid` header is missing or names an unknown key.
    #[error("missing or unknown key id")]
    UnknownKey,

    /// The token is outside its validity window.
    #[error("token is expired")]
    Expired,

    /// The `iss` claim does not match the configured issuer.
    #[error("unexpected issuer")]
    UnexpectedIssuer,

    /// The `aud` claim does not match the expected audience.
    #[error("unexpected audience")]
    UnexpectedAudience,

    /// The `typ` claim does not match the expected token kind.
    #[error("unexpected token type: expected {expected}, got {got}")]
    WrongType {
        /// Kind the caller asked to parse.
        expected: &'static str,
        /// Kind found in the token.
        got: String,
    },
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => Self::Expired,
            ErrorKind::InvalidIssuer => Self::UnexpectedIssuer,
            ErrorKind::InvalidAudience => Self::UnexpectedAudience,
            ErrorKind::InvalidSignature => Self::Signature,
            _ => Self::Format(err.to_string()),
        }
    }
}
