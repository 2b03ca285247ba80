//! # ldgate-ldap
//!
//! LDAP directory connector: service-account binds, bind-as-user credential
//! checks, and attribute lookups for claim projection.
//!
//! Connections are not pooled. Each operation acquires a session and
//! releases it on every exit path; a session that has been rebound as an
//! end user is never reused for service searches.

#![forbid(unsafe_code)]

pub mod connection;
pub mod error;

pub use connection::{LdapConnector, LdapSession};
pub use error::LdapError;
