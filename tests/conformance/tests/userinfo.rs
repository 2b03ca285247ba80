//! Userinfo endpoint behavior.

use axum::http::StatusCode;
use chrono::Utc;

use ldgate_token::{TokenManager, TokenTtl};

use crate::harness::{app, get_with, post_form, signing_key, token_manager, ISSUER};

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[tokio::test]
async fn userinfo_returns_projected_claims_with_cors() {
    let app = app();
    let token = token_manager()
        .create_access_token("alice", "cli1", "openid profile email", Utc::now().timestamp())
        .unwrap();

    let auth = bearer(&token);
    let reply = get_with(&app, "/login/userinfo", &[("authorization", &auth)]).await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    let json = reply.json();
    assert_eq!(json["sub"], "alice");
    assert_eq!(json["name"], "Alice Armstrong");
    assert_eq!(json["email"], "alice@example.com");
    // Scope "phone" was not granted, so its claim stays out.
    assert!(json.get("phone_number").is_none());

    assert_eq!(
        reply
            .headers
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "https://app.example.com"
    );
}

#[tokio::test]
async fn expired_token_gets_a_401_with_a_bearer_challenge() {
    let app = app();
    let expired_minter = TokenManager::new(
        ISSUER,
        signing_key(),
        TokenTtl::from_secs(-300, -300, -300),
    );
    let token = expired_minter
        .create_access_token("alice", "cli1", "openid", Utc::now().timestamp())
        .unwrap();

    let auth = bearer(&token);
    let reply = get_with(&app, "/login/userinfo", &[("authorization", &auth)]).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    let challenge = reply
        .headers
        .get("www-authenticate")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(challenge.starts_with("Bearer "));
    assert!(challenge.contains("error=\"invalid_token\""));
    assert_eq!(reply.json()["error"], "invalid_token");
}

#[tokio::test]
async fn vanished_users_invalidate_their_tokens() {
    let app = app();
    let token = token_manager()
        .create_access_token("ghost", "cli1", "openid profile", Utc::now().timestamp())
        .unwrap();

    let auth = bearer(&token);
    let reply = get_with(&app, "/login/userinfo", &[("authorization", &auth)]).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    let json = reply.json();
    assert_eq!(json["error"], "invalid_token");
    assert!(json["error_description"]
        .as_str()
        .unwrap()
        .contains("not found or disabled"));
}

#[tokio::test]
async fn missing_bearer_token_is_a_401() {
    let app = app();
    let reply = get_with(&app, "/login/userinfo", &[]).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.headers.get("www-authenticate").is_some());
}

#[tokio::test]
async fn an_id_token_is_not_an_access_token() {
    let app = app();
    let id_token = token_manager()
        .create_id_token(ldgate_token::NewIdToken {
            subject: "alice",
            client_id: "cli1",
            nonce: None,
            auth_time: Utc::now().timestamp(),
            at_hash: None,
            c_hash: None,
            extra: serde_json::Map::new(),
        })
        .unwrap();

    let auth = bearer(&id_token);
    let reply = get_with(&app, "/login/userinfo", &[("authorization", &auth)]).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_behaves_like_get() {
    let app = app();
    let token = token_manager()
        .create_access_token("alice", "cli1", "openid email", Utc::now().timestamp())
        .unwrap();

    let auth = bearer(&token);
    let reply = post_form(&app, "/login/userinfo", &[], &[("authorization", &auth)]).await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.json()["email"], "alice@example.com");
}
