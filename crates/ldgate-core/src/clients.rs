//! Registered relying-party clients.
//!
//! Clients are declared statically in the configuration file. A request's
//! `redirect_uri` must match one of the client's registered patterns before
//! anything is ever redirected to it.

use serde::{Deserialize, Serialize};

/// A statically registered relying-party client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredClient {
    /// Client secret, verified at the token endpoint when client
    /// authentication is enabled.
    pub secret: String,

    /// Allowed redirect URI patterns. `*` matches any run of characters.
    #[serde(rename = "redirect_uri", default)]
    pub redirect_uris: Vec<String>,

    /// Origin allowed to call the userinfo endpoint from a browser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_origin: Option<String>,
}

impl RegisteredClient {
    /// Checks whether a redirect URI matches one of the registered patterns.
    #[must_use]
    pub fn redirect_allowed(&self, uri: &str) -> bool {
        self.redirect_uris
            .iter()
            .any(|pattern| wildcard_match(pattern, uri))
    }
}

/// Matches `value` against `pattern`, where `*` matches any run of bytes.
#[must_use]
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    let (mut p_idx, mut v_idx) = (0usize, 0usize);
    let (mut star_idx, mut match_idx) = (None, 0usize);
    let pattern_bytes = pattern.as_bytes();
    let value_bytes = value.as_bytes();

    while v_idx < value_bytes.len() {
        if p_idx < pattern_bytes.len() && pattern_bytes[p_idx] == b'*' {
            star_idx = Some(p_idx);
            match_idx = v_idx;
            p_idx += 1;
            continue;
        }

        if p_idx < pattern_bytes.len() && pattern_bytes[p_idx] == value_bytes[v_idx] {
            p_idx += 1;
            v_idx += 1;
            continue;
        }

        if let Some(star) = star_idx {
            p_idx = star + 1;
            match_idx += 1;
            v_idx = match_idx;
            continue;
        }

        return false;
    }

    while p_idx < pattern_bytes.len() && pattern_bytes[p_idx] == b'*' {
        p_idx += 1;
    }

    p_idx == pattern_bytes.len()
}
