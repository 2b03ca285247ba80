//! The seam between the protocol core and the identity directory.
//!
//! Handlers talk to this trait; the server wires the LDAP connector behind
//! it, and the conformance tests substitute a scripted in-memory directory.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a directory backend.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Transport or directory failure. Surfaces as `server_error`.
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    /// The credentials did not verify.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The subject has no usable entry (vanished or disabled).
    #[error("user not found")]
    NotFound,
}

/// Identity backend used for credential checks and claim attributes.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// Verifies a user's credentials.
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), DirectoryError>;

    /// Fetches the requested attributes of a user entry. Attributes missing
    /// from the entry are omitted from the map.
    async fn user_attributes(
        &self,
        username: &str,
        attributes: &[String],
    ) -> Result<HashMap<String, Vec<String>>, DirectoryError>;
}
