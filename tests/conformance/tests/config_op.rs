//! Discovery document and JWKS.

use axum::http::StatusCode;

use crate::harness::{app, get, signing_key};

#[tokio::test]
async fn discovery_document_has_the_fixed_surface() {
    let app = app();
    let reply = get(&app, "/.well-known/openid-configuration").await;
    assert_eq!(reply.status, StatusCode::OK);

    let json = reply.json();
    assert_eq!(json["issuer"], "http://localhost:8000");
    assert_eq!(
        json["authorization_endpoint"],
        "http://localhost:8000/login"
    );
    assert_eq!(json["token_endpoint"], "http://localhost:8000/login/token");
    assert_eq!(
        json["userinfo_endpoint"],
        "http://localhost:8000/login/userinfo"
    );
    assert_eq!(json["jwks_uri"], "http://localhost:8000/login/jwks");

    assert_eq!(json["response_types_supported"].as_array().unwrap().len(), 7);
    assert_eq!(
        json["response_modes_supported"],
        serde_json::json!(["query", "fragment"])
    );
    assert_eq!(
        json["grant_types_supported"],
        serde_json::json!(["authorization_code"])
    );
    assert_eq!(json["subject_types_supported"], serde_json::json!(["public"]));
    assert_eq!(
        json["id_token_signing_alg_values_supported"],
        serde_json::json!(["RS256"])
    );
    assert_eq!(json["display_values_supported"], serde_json::json!(["page"]));

    let scopes = json["scopes_supported"].as_array().unwrap();
    assert!(scopes.contains(&serde_json::json!("openid")));
    assert!(scopes.contains(&serde_json::json!("profile")));

    let claims = json["claims_supported"].as_array().unwrap();
    for claim in ["iss", "sub", "aud", "exp", "iat", "typ", "auth_time", "name", "email"] {
        assert!(
            claims.contains(&serde_json::json!(claim)),
            "missing claim {claim}"
        );
    }
}

#[tokio::test]
async fn discovery_is_stable_across_startups() {
    let first = get(&app(), "/.well-known/openid-configuration").await;
    let second = get(&app(), "/.well-known/openid-configuration").await;
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn jwks_publishes_the_signing_key() {
    let app = app();
    let reply = get(&app, "/login/jwks").await;
    assert_eq!(reply.status, StatusCode::OK);

    let json = reply.json();
    let keys = json["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 1);

    let key = &keys[0];
    assert_eq!(key["kty"], "RSA");
    assert_eq!(key["use"], "sig");
    assert_eq!(key["alg"], "RS256");
    assert_eq!(key["kid"], signing_key().kid());
    assert!(!key["n"].as_str().unwrap().is_empty());
    assert!(!key["e"].as_str().unwrap().is_empty());
}
