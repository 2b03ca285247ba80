//! # ldgate-oidc
//!
//! The `OpenID` Connect protocol core: authorization request parsing and
//! validation, the authorize/login state machine, response composition, and
//! the HTTP endpoint handlers (authorize, token, userinfo, discovery, JWKS).
//!
//! Handlers own no protocol state. Every authorization request is
//! self-contained in its parameters and in the signed cookies and form
//! tokens it carries, so requests never share mutable state.

#![forbid(unsafe_code)]

pub mod authorize;
pub mod endpoints;
pub mod error;
pub mod provider;
pub mod request;
pub mod session;
pub mod types;

pub use endpoints::router::router;
pub use endpoints::state::AppState;
pub use error::{ErrorResponse, OidcError};
pub use provider::{DirectoryError, DirectoryProvider};
