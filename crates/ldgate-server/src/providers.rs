//! Glue between the protocol core and the LDAP connector.

use std::collections::HashMap;

use async_trait::async_trait;

use ldgate_ldap::{LdapConnector, LdapError};
use ldgate_oidc::{DirectoryError, DirectoryProvider};

/// [`DirectoryProvider`] backed by the LDAP connector.
///
/// Each call acquires its own directory session and releases it on every
/// exit path.
pub struct LdapDirectory {
    connector: LdapConnector,
}

impl LdapDirectory {
    /// Wraps a connector.
    #[must_use]
    pub fn new(connector: LdapConnector) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl DirectoryProvider for LdapDirectory {
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), DirectoryError> {
        let mut session = self
            .connector
            .connect()
            .await
            .map_err(directory_error)?;

        let result = session.bind_as(username, password).await;
        session.close().await;
        result.map_err(directory_error)
    }

    async fn user_attributes(
        &self,
        username: &str,
        attributes: &[String],
    ) -> Result<HashMap<String, Vec<String>>, DirectoryError> {
        let mut session = self
            .connector
            .connect()
            .await
            .map_err(directory_error)?;

        let result = session.get_user_attributes(username, attributes).await;
        session.close().await;
        result.map_err(directory_error)
    }
}

fn directory_error(err: LdapError) -> DirectoryError {
    match err {
        LdapError::AuthFailure => DirectoryError::InvalidCredentials,
        LdapError::NotFound(_) => DirectoryError::NotFound,
        LdapError::Connect(cause) | LdapError::Search(cause) => {
            DirectoryError::Unavailable(cause)
        }
    }
}
