//! # ldgate-token
//!
//! The token subsystem: one RSA key pair, RS256-signed JWTs for every token
//! kind the provider mints (authorization code, access token, ID token, SSO
//! cookie), and the validation rules they share.
//!
//! All kinds are ordinary JWTs distinguished by the `typ` claim. Parsing
//! verifies the signature before any claim is inspected, and a token never
//! validates under a mismatched `typ`.

#![forbid(unsafe_code)]

pub mod claims;
pub mod error;
pub mod jwks;
pub mod keys;
pub mod manager;

pub use claims::{typ, AccessTokenClaims, CodeClaims, IdTokenClaims, SsoTokenClaims};
pub use error::TokenError;
pub use jwks::{JsonWebKey, JsonWebKeySet};
pub use keys::SigningKey;
pub use manager::{left_half_hash, s256_hash, NewCode, NewIdToken, TokenManager, TokenTtl};
