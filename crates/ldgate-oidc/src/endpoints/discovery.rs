//! Discovery and JWKS endpoint handlers.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use ldgate_core::AppConfig;
use ldgate_token::JsonWebKeySet;

use super::state::AppState;

/// The OpenID Provider configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenIdConfiguration {
    /// Issuer identifier.
    pub issuer: String,

    /// Authorization endpoint URL.
    pub authorization_endpoint: String,

    /// Token endpoint URL.
    pub token_endpoint: String,

    /// Userinfo endpoint URL.
    pub userinfo_endpoint: String,

    /// JWKS document URL.
    pub jwks_uri: String,

    /// Supported scopes, configured plus the implicit `openid`.
    pub scopes_supported: Vec<String>,

    /// All seven response type combinations.
    pub response_types_supported: Vec<String>,

    /// Query and fragment.
    pub response_modes_supported: Vec<String>,

    /// Only the authorization code grant.
    pub grant_types_supported: Vec<String>,

    /// Public subjects only.
    pub subject_types_supported: Vec<String>,

    /// RS256 only.
    pub id_token_signing_alg_values_supported: Vec<String>,

    /// Page only.
    pub display_values_supported: Vec<String>,

    /// Configured claims plus the standard token claims.
    pub claims_supported: Vec<String>,
}

impl OpenIdConfiguration {
    /// Builds the document from the configuration. The output is a pure
    /// function of the configuration, so it is stable across restarts.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let mut scopes = config.scopes.scope_names();
        scopes.push("openid".to_string());

        let mut claims = config.scopes.all_claims();
        for standard in ["iss", "sub", "aud", "exp", "iat", "typ", "auth_time"] {
            claims.push(standard.to_string());
        }

        Self {
            issuer: config.issuer_str(),
            authorization_endpoint: config.endpoint_url(&config.endpoints.authorization),
            token_endpoint: config.endpoint_url(&config.endpoints.token),
            userinfo_endpoint: config.endpoint_url(&config.endpoints.userinfo),
            jwks_uri: config.endpoint_url(&config.endpoints.jwks),
            scopes_supported: scopes,
            response_types_supported: [
                "code",
                "token",
                "id_token",
                "code token",
                "code id_token",
                "token id_token",
                "code token id_token",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            response_modes_supported: vec!["query".to_string(), "fragment".to_string()],
            grant_types_supported: vec!["authorization_code".to_string()],
            subject_types_supported: vec!["public".to_string()],
            id_token_signing_alg_values_supported: vec!["RS256".to_string()],
            display_values_supported: vec!["page".to_string()],
            claims_supported: claims,
        }
    }
}

/// GET discovery endpoint.
pub async fn discovery(State(state): State<AppState>) -> Json<OpenIdConfiguration> {
    Json(OpenIdConfiguration::from_config(&state.config))
}

/// GET JWKS endpoint.
pub async fn jwks(State(state): State<AppState>) -> Json<JsonWebKeySet> {
    Json(JsonWebKeySet::single(state.tokens.key().jwk()))
}
