//! # ldgate-server
//!
//! Wires the configuration, key material, LDAP connector, and protocol
//! router into a runnable HTTP server.

#![forbid(unsafe_code)]

pub mod providers;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;

use ldgate_core::AppConfig;
use ldgate_ldap::LdapConnector;
use ldgate_oidc::AppState;
use ldgate_token::{SigningKey, TokenManager, TokenTtl};

use crate::providers::LdapDirectory;

/// The assembled server.
pub struct Server {
    config: Arc<AppConfig>,
    router: Router,
}

impl Server {
    /// Builds the server: loads or generates the signing key and assembles
    /// the router.
    ///
    /// # Errors
    ///
    /// Returns an error when the key material cannot be loaded or written.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let key = match &config.key_file {
            Some(path) => SigningKey::load_or_generate(path)
                .with_context(|| format!("load signing key from {}", path.display()))?,
            None => {
                tracing::warn!("no key_file configured, generating an ephemeral signing key");
                SigningKey::generate().context("generate signing key")?
            }
        };
        tracing::info!(kid = key.kid(), "signing key ready");

        let ttl = TokenTtl::from_secs(
            ttl_secs(config.ttl.code),
            ttl_secs(config.ttl.token),
            ttl_secs(config.ttl.sso),
        );
        let tokens = TokenManager::new(config.issuer_str(), key, ttl);
        let directory = LdapDirectory::new(LdapConnector::new(config.ldap.clone()));

        let config = Arc::new(config);
        let state = AppState::new(config.clone(), Arc::new(tokens), Arc::new(directory));
        let router = ldgate_oidc::router(state);

        Ok(Self { config, router })
    }

    /// The assembled router, for in-process testing.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Binds the listen address and serves until interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error when the address cannot be bound.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.listen)
            .await
            .with_context(|| format!("bind {}", self.config.listen))?;

        tracing::info!(
            listen = %self.config.listen,
            issuer = %self.config.issuer_str(),
            "ldgate listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("serve")?;

        tracing::info!("shut down cleanly");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install the interrupt handler");
    }
}

fn ttl_secs(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
