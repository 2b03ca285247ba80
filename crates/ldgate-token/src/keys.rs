//! RSA key material.
//!
//! The provider owns exactly one RSA-2048 key pair. It is loaded from a PEM
//! file when one exists, generated (and persisted) otherwise. The `kid` is
//! derived from the public modulus, so it is stable across restarts for the
//! same key.

use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};

use crate::error::TokenError;
use crate::jwks::JsonWebKey;

/// RSA key size in bits.
const KEY_BITS: usize = 2048;

/// The provider's signing key pair.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    modulus: String,
    exponent: String,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("encoding", &"[REDACTED]")
            .finish()
    }
}

impl SigningKey {
    /// Generates a fresh ephemeral key pair.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails.
    pub fn generate() -> Result<Self, TokenError> {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), KEY_BITS)
            .map_err(|e| TokenError::Key(e.to_string()))?;
        Self::from_private(&private)
    }

    /// Parses a key pair from a PEM-encoded private key (PKCS#8 or PKCS#1).
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM does not contain a usable RSA key.
    pub fn from_pem(pem: &str) -> Result<Self, TokenError> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| TokenError::Key(e.to_string()))?;
        Self::from_private(&private)
    }

    /// Loads the key from `path`, generating and persisting a new one when
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, or the key
    /// material is invalid.
    pub fn load_or_generate(path: &Path) -> Result<Self, TokenError> {
        if path.exists() {
            let pem = std::fs::read_to_string(path)
                .map_err(|e| TokenError::Key(format!("read {}: {e}", path.display())))?;
            return Self::from_pem(&pem);
        }

        let private = RsaPrivateKey::new(&mut rand::thread_rng(), KEY_BITS)
            .map_err(|e| TokenError::Key(e.to_string()))?;
        let pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| TokenError::Key(e.to_string()))?;
        std::fs::write(path, pem.as_bytes())
            .map_err(|e| TokenError::Key(format!("write {}: {e}", path.display())))?;

        Self::from_private(&private)
    }

    fn from_private(private: &RsaPrivateKey) -> Result<Self, TokenError> {
        let pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| TokenError::Key(e.to_string()))?;
        let encoding = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| TokenError::Key(e.to_string()))?;

        let n = private.n().to_bytes_be();
        let e = private.e().to_bytes_be();
        let modulus = URL_SAFE_NO_PAD.encode(&n);
        let exponent = URL_SAFE_NO_PAD.encode(&e);
        let decoding = DecodingKey::from_rsa_components(&modulus, &exponent)
            .map_err(|e| TokenError::Key(e.to_string()))?;

        Ok(Self {
            kid: fingerprint(&n),
            encoding,
            decoding,
            modulus,
            exponent,
        })
    }

    /// The key id, published in JWKS and stamped into every token header.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Key used for signing.
    #[must_use]
    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    /// Key used for verification.
    #[must_use]
    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }

    /// The public half in JWK form.
    #[must_use]
    pub fn jwk(&self) -> JsonWebKey {
        JsonWebKey::rsa_public(&self.kid, &self.modulus, &self.exponent)
    }
}

/// Derives a stable key id from the public modulus.
fn fingerprint(modulus: &[u8]) -> String {
    let digest = Sha256::digest(modulus);
    URL_SAFE_NO_PAD.encode(&digest[..8])
}
