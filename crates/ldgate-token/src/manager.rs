//! The token manager: minting, parsing, and validating signed tokens.
//!
//! Parsing order is fixed: `kid` header check, signature verification,
//! expiry and issuer checks, then `typ` and audience. A token parsed as the
//! wrong kind never validates.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::claims::{typ, AccessTokenClaims, CodeClaims, IdTokenClaims, SsoTokenClaims};
use crate::error::TokenError;
use crate::keys::SigningKey;

/// Lifetimes for the minted token kinds.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtl {
    /// Authorization code lifetime.
    pub code: Duration,

    /// Access and ID token lifetime.
    pub access: Duration,

    /// SSO token lifetime.
    pub sso: Duration,
}

impl TokenTtl {
    /// Builds lifetimes from whole seconds.
    #[must_use]
    pub fn from_secs(code: i64, access: i64, sso: i64) -> Self {
        Self {
            code: Duration::seconds(code),
            access: Duration::seconds(access),
            sso: Duration::seconds(sso),
        }
    }
}

/// Inputs for minting an authorization code.
#[derive(Debug, Clone)]
pub struct NewCode<'a> {
    /// Authenticated subject.
    pub subject: &'a str,

    /// Requesting client.
    pub client_id: &'a str,

    /// Granted scopes, space delimited.
    pub scope: &'a str,

    /// Redirect URI the code is bound to.
    pub redirect_uri: &'a str,

    /// Nonce from the request, if any.
    pub nonce: Option<&'a str>,

    /// PKCE challenge, if any.
    pub code_challenge: Option<&'a str>,

    /// PKCE challenge method.
    pub code_challenge_method: Option<&'a str>,

    /// When the user authenticated.
    pub auth_time: i64,
}

/// Inputs for minting an ID token.
#[derive(Debug, Clone)]
pub struct NewIdToken<'a> {
    /// Authenticated subject.
    pub subject: &'a str,

    /// Audience client.
    pub client_id: &'a str,

    /// Nonce to echo, if any.
    pub nonce: Option<&'a str>,

    /// When the user authenticated.
    pub auth_time: i64,

    /// Left-half hash of the sibling access token.
    pub at_hash: Option<String>,

    /// Left-half hash of the sibling code.
    pub c_hash: Option<String>,

    /// Scope-projected claims.
    pub extra: Map<String, Value>,
}

/// Mints and validates the provider's tokens.
#[derive(Debug, Clone)]
pub struct TokenManager {
    issuer: String,
    key: SigningKey,
    ttl: TokenTtl,
}

impl TokenManager {
    /// Creates a manager for the given issuer, key, and lifetimes.
    pub fn new(issuer: impl Into<String>, key: SigningKey, ttl: TokenTtl) -> Self {
        Self {
            issuer: issuer.into(),
            key,
            ttl,
        }
    }

    /// The configured issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The signing key.
    #[must_use]
    pub fn key(&self) -> &SigningKey {
        &self.key
    }

    /// Access token lifetime in whole seconds, for `expires_in`.
    #[must_use]
    pub fn access_ttl_secs(&self) -> i64 {
        self.ttl.access.num_seconds()
    }

    /// Authorization code lifetime.
    #[must_use]
    pub fn code_ttl(&self) -> Duration {
        self.ttl.code
    }

    /// SSO token lifetime in whole seconds, for the cookie `Max-Age`.
    #[must_use]
    pub fn sso_ttl_secs(&self) -> i64 {
        self.ttl.sso.num_seconds()
    }

    /// Mints an authorization code.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn create_code(&self, code: &NewCode<'_>) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = CodeClaims {
            iss: self.issuer.clone(),
            sub: code.subject.to_string(),
            aud: code.client_id.to_string(),
            exp: (now + self.ttl.code).timestamp(),
            iat: now.timestamp(),
            typ: typ::CODE.to_string(),
            jti: Uuid::now_v7().to_string(),
            scope: code.scope.to_string(),
            auth_time: code.auth_time,
            redirect_uri: code.redirect_uri.to_string(),
            nonce: code.nonce.map(ToString::to_string),
            code_challenge: code.code_challenge.map(ToString::to_string),
            code_challenge_method: code.code_challenge_method.map(ToString::to_string),
        };
        self.sign(&claims)
    }

    /// Mints an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn create_access_token(
        &self,
        subject: &str,
        client_id: &str,
        scope: &str,
        auth_time: i64,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            aud: client_id.to_string(),
            exp: (now + self.ttl.access).timestamp(),
            iat: now.timestamp(),
            typ: typ::ACCESS_TOKEN.to_string(),
            jti: Uuid::now_v7().to_string(),
            scope: scope.to_string(),
            auth_time,
            azp: vec![client_id.to_string()],
        };
        self.sign(&claims)
    }

    /// Mints an ID token.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn create_id_token(&self, id: NewIdToken<'_>) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = IdTokenClaims {
            iss: self.issuer.clone(),
            sub: id.subject.to_string(),
            aud: id.client_id.to_string(),
            exp: (now + self.ttl.access).timestamp(),
            iat: now.timestamp(),
            typ: typ::ID_TOKEN.to_string(),
            auth_time: id.auth_time,
            azp: Some(id.client_id.to_string()),
            nonce: id.nonce.map(ToString::to_string),
            at_hash: id.at_hash,
            c_hash: id.c_hash,
            extra: id.extra,
        };
        self.sign(&claims)
    }

    /// Mints an SSO token recording the clients this session covers.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn create_sso_token(
        &self,
        subject: &str,
        auth_time: i64,
        clients: Vec<String>,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = SsoTokenClaims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            aud: self.issuer.clone(),
            exp: (now + self.ttl.sso).timestamp(),
            iat: now.timestamp(),
            typ: typ::SSO_TOKEN.to_string(),
            jti: Uuid::now_v7().to_string(),
            auth_time,
            azp: clients,
        };
        self.sign(&claims)
    }

    /// Parses and validates an authorization code.
    ///
    /// The caller still checks `aud` against the exchanging client.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn parse_code(&self, raw: &str) -> Result<CodeClaims, TokenError> {
        let claims: CodeClaims = self.verify(raw)?;
        expect_typ(typ::CODE, &claims.typ)?;
        Ok(claims)
    }

    /// Parses and validates an access token.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn parse_access_token(&self, raw: &str) -> Result<AccessTokenClaims, TokenError> {
        let claims: AccessTokenClaims = self.verify(raw)?;
        expect_typ(typ::ACCESS_TOKEN, &claims.typ)?;
        Ok(claims)
    }

    /// Parses and validates an ID token.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn parse_id_token(&self, raw: &str) -> Result<IdTokenClaims, TokenError> {
        let claims: IdTokenClaims = self.verify(raw)?;
        expect_typ(typ::ID_TOKEN, &claims.typ)?;
        Ok(claims)
    }

    /// Parses and validates an SSO token, including its self-audience.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn parse_sso_token(&self, raw: &str) -> Result<SsoTokenClaims, TokenError> {
        let claims: SsoTokenClaims = self.verify(raw)?;
        expect_typ(typ::SSO_TOKEN, &claims.typ)?;
        if claims.aud != self.issuer {
            return Err(TokenError::UnexpectedAudience);
        }
        Ok(claims)
    }

    /// Signs arbitrary claims under the provider key.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or signing fails.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key.kid().to_string());

        encode(&header, claims, self.key.encoding())
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies signature, `kid`, expiry, and issuer, then deserializes.
    ///
    /// Audience and `typ` checks belong to the typed wrappers: the expected
    /// values differ per token kind.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn verify<T: DeserializeOwned>(&self, raw: &str) -> Result<T, TokenError> {
        let header = decode_header(raw).map_err(|e| TokenError::Format(e.to_string()))?;
        match header.kid {
            Some(ref kid) if kid == self.key.kid() => {}
            _ => return Err(TokenError::UnknownKey),
        }

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<T>(raw, self.key.decoding(), &validation)?;
        Ok(data.claims)
    }
}

/// Left half of a SHA-256 digest, base64url encoded.
///
/// This is the `at_hash`/`c_hash` construction for RS256 ID tokens and the
/// PKCE `S256` transformation applied to code verifiers.
#[must_use]
pub fn left_half_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}

/// Full SHA-256 digest, base64url encoded.
///
/// This is the PKCE `S256` transformation: a code verifier hashes to the
/// recorded code challenge.
#[must_use]
pub fn s256_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

fn expect_typ(expected: &'static str, got: &str) -> Result<(), TokenError> {
    if got == expected {
        Ok(())
    } else {
        Err(TokenError::WrongType {
            expected,
            got: got.to_string(),
        })
    }
}
