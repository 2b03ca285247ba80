//! Hybrid flows: code plus tokens in one round trip.

use axum::http::StatusCode;
use ldgate_token::left_half_hash;

use crate::harness::{app, fragment_params, login, token_manager};

fn uri(response_type: &str, nonce: &str) -> String {
    format!(
        "/login?response_type={response_type}&client_id=cli1&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb&scope=openid+profile&state=st-h&nonce={nonce}"
    )
}

#[tokio::test]
async fn code_and_id_token_share_the_fragment() {
    let app = app();
    let reply = login(&app, &uri("code+id_token", "n2"), "alice", "secret").await;

    assert_eq!(reply.status, StatusCode::FOUND);
    let params = fragment_params(reply.location());

    let code = params.get("code").expect("code in fragment");
    let id = token_manager()
        .parse_id_token(params.get("id_token").expect("id_token in fragment"))
        .unwrap();

    assert_eq!(id.nonce.as_deref(), Some("n2"));
    assert_eq!(id.c_hash.as_deref(), Some(left_half_hash(code)).as_deref());
    assert!(id.at_hash.is_none());
    // No access token in this combination, so claims are embedded.
    assert_eq!(id.extra["name"], "Alice Armstrong");
    assert_eq!(params.get("state").map(String::as_str), Some("st-h"));
}

#[tokio::test]
async fn full_hybrid_defers_claims_to_userinfo() {
    let app = app();
    let reply = login(&app, &uri("code+token+id_token", "n3"), "alice", "secret").await;

    assert_eq!(reply.status, StatusCode::FOUND);
    let params = fragment_params(reply.location());

    let code = params.get("code").expect("code in fragment");
    let access_token = params.get("access_token").expect("access_token in fragment");
    let id = token_manager()
        .parse_id_token(params.get("id_token").expect("id_token in fragment"))
        .unwrap();

    assert_eq!(id.at_hash.as_deref(), Some(left_half_hash(access_token)).as_deref());
    assert_eq!(id.c_hash.as_deref(), Some(left_half_hash(code)).as_deref());
    // An access token travels alongside, so claims wait for userinfo.
    assert!(!id.extra.contains_key("name"));
    assert_eq!(id.nonce.as_deref(), Some("n3"));
}
