//! JSON Web Key Set types, as served by the JWKS endpoint.

use serde::{Deserialize, Serialize};

/// One public key in JWK form (RFC 7517).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type. Always `RSA` here.
    pub kty: String,

    /// Public key use.
    #[serde(rename = "use")]
    pub key_use: String,

    /// Intended algorithm.
    pub alg: String,

    /// Key id.
    pub kid: String,

    /// RSA modulus, base64url without padding.
    pub n: String,

    /// RSA exponent, base64url without padding.
    pub e: String,
}

impl JsonWebKey {
    /// Builds an RS256 signing key entry.
    #[must_use]
    pub fn rsa_public(kid: &str, modulus: &str, exponent: &str) -> Self {
        Self {
            kty: "RSA".to_string(),
            key_use: "sig".to_string(),
            alg: "RS256".to_string(),
            kid: kid.to_string(),
            n: modulus.to_string(),
            e: exponent.to_string(),
        }
    }
}

/// The key set document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// Published keys.
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    /// Builds a set holding a single key.
    #[must_use]
    pub fn single(key: JsonWebKey) -> Self {
        Self { keys: vec![key] }
    }

    /// Finds a key by id.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}
