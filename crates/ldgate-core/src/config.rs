//! Server configuration.
//!
//! Loaded from a YAML file over a complete set of defaults, so every field
//! in the file is optional. The resulting [`AppConfig`] is immutable after
//! startup and shared by reference through the request handlers.

use std::collections::BTreeMap;
use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::clients::RegisteredClient;
use crate::scopes::ScopeConfig;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML or does not match the schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Token and cookie lifetimes, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlConfig {
    /// Authorization code lifetime.
    pub code: u64,

    /// Access token lifetime.
    pub token: u64,

    /// SSO cookie lifetime.
    pub sso: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            code: 10 * 60,            // 10 minutes
            token: 7 * 24 * 60 * 60,  // 7 days
            sso: 14 * 24 * 60 * 60,   // 14 days
        }
    }
}

/// Endpoint path overrides, relative to the issuer path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Authorization endpoint path.
    pub authorization: String,

    /// Token endpoint path.
    pub token: String,

    /// Userinfo endpoint path.
    pub userinfo: String,

    /// JWKS endpoint path.
    pub jwks: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            authorization: "/login".to_string(),
            token: "/login/token".to_string(),
            userinfo: "/login/userinfo".to_string(),
            jwks: "/login/jwks".to_string(),
        }
    }
}

/// LDAP directory connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LdapSettings {
    /// Directory URL (`ldap://` or `ldaps://`).
    pub server: String,

    /// Service account DN used for user lookups.
    pub bind_dn: String,

    /// Service account password.
    pub bind_password: String,

    /// Base DN under which user entries live.
    pub base_dn: String,

    /// Attribute holding the login name (also the token subject).
    pub id_attribute: String,
}

impl Default for LdapSettings {
    fn default() -> Self {
        Self {
            server: "ldap://localhost:389".to_string(),
            bind_dn: String::new(),
            bind_password: String::new(),
            base_dn: String::new(),
            id_attribute: "uid".to_string(),
        }
    }
}

/// Full server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Issuer URL. Also the base for all endpoint URLs.
    pub issuer: Url,

    /// Listen address for the HTTP server.
    pub listen: SocketAddr,

    /// Path of the RSA key PEM file. Generated there if absent.
    /// When unset, an ephemeral key is generated at startup.
    pub key_file: Option<PathBuf>,

    /// Token and cookie lifetimes.
    pub ttl: TtlConfig,

    /// Endpoint path overrides.
    pub endpoints: EndpointConfig,

    /// Scope definitions (claim projection rules per scope).
    pub scopes: ScopeConfig,

    /// Registered relying-party clients, keyed by `client_id`.
    pub clients: BTreeMap<String, RegisteredClient>,

    /// Whether the token endpoint requires `client_secret`.
    pub enable_client_auth: bool,

    /// Directory connection settings.
    pub ldap: LdapSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            issuer: Url::parse("http://localhost:8000").expect("default issuer URL"),
            listen: "127.0.0.1:8000".parse().expect("default listen address"),
            key_file: None,
            ttl: TtlConfig::default(),
            endpoints: EndpointConfig::default(),
            scopes: ScopeConfig::default(),
            clients: BTreeMap::new(),
            enable_client_auth: false,
            ldap: LdapSettings::default(),
        }
    }
}

/// Resolved absolute paths for all served endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// `/.well-known/openid-configuration` under the issuer path.
    pub discovery: String,

    /// Authorization endpoint.
    pub authorization: String,

    /// Token endpoint.
    pub token: String,

    /// Userinfo endpoint.
    pub userinfo: String,

    /// JWKS endpoint.
    pub jwks: String,
}

impl AppConfig {
    /// Loads the configuration from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or parsed.
    pub fn load(mut reader: impl Read) -> Result<Self, ConfigError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Loads the configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load(std::fs::File::open(path)?)
    }

    /// The issuer as a string, without a trailing slash.
    ///
    /// This exact value is used as the `iss` claim of every minted token.
    #[must_use]
    pub fn issuer_str(&self) -> String {
        self.issuer.as_str().trim_end_matches('/').to_string()
    }

    /// The issuer URL path, used as the SSO cookie path.
    #[must_use]
    pub fn issuer_path(&self) -> String {
        let path = self.issuer.path().trim_end_matches('/');
        if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        }
    }

    /// Looks up a registered client by `client_id`.
    #[must_use]
    pub fn client(&self, client_id: &str) -> Option<&RegisteredClient> {
        self.clients.get(client_id)
    }

    /// Resolves the absolute paths of all served endpoints.
    #[must_use]
    pub fn resolved_paths(&self) -> ResolvedPaths {
        let base = self.issuer.path().trim_end_matches('/');
        ResolvedPaths {
            discovery: join_path(base, "/.well-known/openid-configuration"),
            authorization: join_path(base, &self.endpoints.authorization),
            token: join_path(base, &self.endpoints.token),
            userinfo: join_path(base, &self.endpoints.userinfo),
            jwks: join_path(base, &self.endpoints.jwks),
        }
    }

    /// The absolute URL of an endpoint, for the discovery document.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.issuer_str(), join_path("", path))
    }
}

/// Joins a base path and an endpoint path with exactly one separating slash.
fn join_path(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    format!("{}/{}", base.trim_end_matches('/'), path)
}
