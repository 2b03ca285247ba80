//! # ldgate-core
//!
//! Configuration model for the ldgate `OpenID` Connect provider:
//! the YAML configuration file, the static client registry, and the
//! scope-to-claim projection rules.
//!
//! The configuration is built once at startup and shared immutably
//! across request handlers.

#![forbid(unsafe_code)]

pub mod clients;
pub mod config;
pub mod scopes;

pub use clients::RegisteredClient;
pub use config::{AppConfig, ConfigError, EndpointConfig, LdapSettings, TtlConfig};
pub use scopes::{ClaimKind, ClaimRule, ScopeConfig};
