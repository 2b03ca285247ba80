//! Directory sessions.
//!
//! [`LdapConnector`] is the cheap, shareable handle constructed at startup;
//! [`LdapSession`] is one live connection, acquired per operation.

use std::collections::HashMap;
use std::sync::Arc;

use ldap3::{ldap_escape, Ldap, LdapConnAsync, Scope, SearchEntry};
use ldgate_core::LdapSettings;

use crate::error::LdapError;

/// Factory for directory sessions.
#[derive(Debug, Clone)]
pub struct LdapConnector {
    settings: Arc<LdapSettings>,
}

impl LdapConnector {
    /// Creates a connector for the configured directory.
    #[must_use]
    pub fn new(settings: LdapSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    /// Opens a session bound as the service account.
    ///
    /// An empty `bind_dn` performs an anonymous bind.
    ///
    /// # Errors
    ///
    /// Returns [`LdapError::Connect`] when the directory is unreachable or
    /// the service bind is refused.
    pub async fn connect(&self) -> Result<LdapSession, LdapError> {
        let (conn, mut ldap) = LdapConnAsync::new(&self.settings.server)
            .await
            .map_err(|e| LdapError::Connect(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!(error = %e, "LDAP connection driver error");
            }
        });

        if !self.settings.bind_dn.is_empty() {
            ldap.simple_bind(&self.settings.bind_dn, &self.settings.bind_password)
                .await
                .map_err(|e| LdapError::Connect(e.to_string()))?
                .success()
                .map_err(|e| LdapError::Connect(e.to_string()))?;
        }

        Ok(LdapSession {
            ldap,
            settings: self.settings.clone(),
        })
    }
}

/// One live directory connection.
pub struct LdapSession {
    ldap: Ldap,
    settings: Arc<LdapSettings>,
}

impl LdapSession {
    /// Verifies a user's credentials by binding as their entry.
    ///
    /// The session is bound as the end user afterwards and must not be
    /// reused for service-account searches.
    ///
    /// # Errors
    ///
    /// [`LdapError::AuthFailure`] when the user does not exist, the password
    /// is empty, or the bind is refused with invalid credentials.
    /// [`LdapError::Connect`] for transport and directory errors.
    pub async fn bind_as(&mut self, username: &str, password: &str) -> Result<(), LdapError> {
        // An empty password would degrade into an unauthenticated bind,
        // which the directory reports as success.
        if password.is_empty() {
            return Err(LdapError::AuthFailure);
        }

        let dn = match self.find_user_dn(username).await? {
            Some(dn) => dn,
            None => return Err(LdapError::AuthFailure),
        };

        let result = self
            .ldap
            .simple_bind(&dn, password)
            .await
            .map_err(|e| LdapError::Connect(e.to_string()))?;

        match result.success() {
            Ok(_) => Ok(()),
            Err(e) => Err(LdapError::from_bind_failure(&e)),
        }
    }

    /// Fetches the requested attributes of a user entry.
    ///
    /// Attributes absent from the entry are simply missing from the map.
    ///
    /// # Errors
    ///
    /// [`LdapError::NotFound`] when no entry matches the subject.
    pub async fn get_user_attributes(
        &mut self,
        username: &str,
        attributes: &[String],
    ) -> Result<HashMap<String, Vec<String>>, LdapError> {
        let filter = self.user_filter(username);
        let attrs: Vec<&str> = attributes.iter().map(String::as_str).collect();

        let (entries, _result) = self
            .ldap
            .search(&self.settings.base_dn, Scope::Subtree, &filter, attrs)
            .await
            .map_err(|e| LdapError::Search(e.to_string()))?
            .success()
            .map_err(|e| LdapError::Search(e.to_string()))?;

        let entry = entries
            .into_iter()
            .next()
            .map(SearchEntry::construct)
            .ok_or_else(|| LdapError::NotFound(username.to_string()))?;

        Ok(entry.attrs)
    }

    /// Resolves a login name to the entry's DN.
    async fn find_user_dn(&mut self, username: &str) -> Result<Option<String>, LdapError> {
        let filter = self.user_filter(username);

        let (entries, _result) = self
            .ldap
            .search(&self.settings.base_dn, Scope::Subtree, &filter, vec!["dn"])
            .await
            .map_err(|e| LdapError::Search(e.to_string()))?
            .success()
            .map_err(|e| LdapError::Search(e.to_string()))?;

        Ok(entries
            .into_iter()
            .next()
            .map(|entry| SearchEntry::construct(entry).dn))
    }

    fn user_filter(&self, username: &str) -> String {
        format!(
            "({}={})",
            self.settings.id_attribute,
            ldap_escape(username)
        )
    }

    /// Releases the connection. Errors during unbind are ignored.
    pub async fn close(mut self) {
        let _ = self.ldap.unbind().await;
    }
}
