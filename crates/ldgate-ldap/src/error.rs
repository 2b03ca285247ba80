//! Connector error types.
//!
//! Error messages never carry passwords or bind credentials.

use thiserror::Error;

/// LDAP result code for invalid credentials.
const INVALID_CREDENTIALS: u32 = 49;

/// Errors raised by the directory connector.
#[derive(Debug, Error)]
pub enum LdapError {
    /// The directory could not be reached or the service bind failed.
    /// Retryable by operator action only.
    #[error("LDAP connection failed: {0}")]
    Connect(String),

    /// The user's credentials did not verify.
    #[error("invalid credentials")]
    AuthFailure,

    /// No entry exists for the subject.
    #[error("user not found: {0}")]
    NotFound(String),

    /// A search operation failed.
    #[error("LDAP search failed: {0}")]
    Search(String),
}

impl LdapError {
    /// Classifies a bind failure: result code 49 is an authentication
    /// mismatch, everything else is a transport or directory error.
    #[must_use]
    pub fn from_bind_failure(err: &ldap3::LdapError) -> Self {
        if let ldap3::LdapError::LdapResult { result } = err {
            if result.rc == INVALID_CREDENTIALS {
                return Self::AuthFailure;
            }
        }
        Self::Connect(err.to_string())
    }
}
