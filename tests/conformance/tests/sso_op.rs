//! SSO cookie reuse across clients and the `prompt` rules.

use axum::http::StatusCode;
use chrono::Utc;

use crate::harness::{
    app, authorize_uri, get_with, login, query_params, token_manager,
};

const CLI2_URI: &str = "/login?response_type=code&client_id=cli2&redirect_uri=https%3A%2F%2Fother.example.com%2Fcb&scope=openid&state=s2";

fn cookie_header(value: &str) -> String {
    format!("ldgate_sso={value}")
}

#[tokio::test]
async fn sso_silently_authenticates_a_second_client() {
    let app = app();

    // Interactive login to cli1 establishes the session.
    let first = login(&app, &authorize_uri(""), "alice", "secret").await;
    assert_eq!(first.status, StatusCode::FOUND);
    let cookie1 = first.cookie("ldgate_sso").unwrap();

    // An interactive-capable request for cli2 reuses the session silently.
    let header = cookie_header(&cookie1);
    let reply = get_with(&app, CLI2_URI, &[("cookie", &header)]).await;
    assert_eq!(reply.status, StatusCode::FOUND, "{}", reply.body);
    let params = query_params(reply.location());
    assert!(params.contains_key("code"));
    assert_eq!(params.get("state").map(String::as_str), Some("s2"));

    // The refreshed cookie now covers cli2, so prompt=none succeeds.
    let cookie2 = reply.cookie("ldgate_sso").unwrap();
    let claims = token_manager().parse_sso_token(&cookie2).unwrap();
    assert!(claims.authorized_for("cli1"));
    assert!(claims.authorized_for("cli2"));

    let header = cookie_header(&cookie2);
    let reply = get_with(
        &app,
        &format!("{CLI2_URI}&prompt=none"),
        &[("cookie", &header)],
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert!(query_params(reply.location()).contains_key("code"));
}

#[tokio::test]
async fn prompt_none_needs_the_client_in_the_session() {
    let app = app();
    let first = login(&app, &authorize_uri(""), "alice", "secret").await;
    let cookie1 = first.cookie("ldgate_sso").unwrap();

    // The session covers cli1 only; no UI may be shown for cli2.
    let header = cookie_header(&cookie1);
    let reply = get_with(
        &app,
        &format!("{CLI2_URI}&prompt=none"),
        &[("cookie", &header)],
    )
    .await;

    assert_eq!(reply.status, StatusCode::FOUND);
    let params = query_params(reply.location());
    assert_eq!(params.get("error").map(String::as_str), Some("login_required"));
    assert_eq!(params.get("state").map(String::as_str), Some("s2"));
}

#[tokio::test]
async fn prompt_none_without_a_session_is_login_required() {
    let app = app();
    let reply = get_with(&app, &authorize_uri("&prompt=none"), &[]).await;

    assert_eq!(reply.status, StatusCode::FOUND);
    let params = query_params(reply.location());
    assert_eq!(params.get("error").map(String::as_str), Some("login_required"));
    assert_eq!(params.get("state").map(String::as_str), Some("xyz"));
}

#[tokio::test]
async fn prompt_login_forces_the_form_despite_a_session() {
    let app = app();
    let first = login(&app, &authorize_uri(""), "alice", "secret").await;
    let cookie = first.cookie("ldgate_sso").unwrap();

    let header = cookie_header(&cookie);
    let reply = get_with(&app, &authorize_uri("&prompt=login"), &[("cookie", &header)]).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(!reply.login_session().is_empty());
}

#[tokio::test]
async fn sessions_older_than_max_age_cannot_be_reused() {
    let app = app();
    // A session authenticated an hour ago.
    let stale = token_manager()
        .create_sso_token("alice", Utc::now().timestamp() - 3600, vec!["cli1".to_string()])
        .unwrap();

    let header = cookie_header(&stale);
    let reply = get_with(&app, &authorize_uri("&max_age=60"), &[("cookie", &header)]).await;
    assert_eq!(reply.status, StatusCode::OK, "stale session must fall back to the form");

    let reply = get_with(
        &app,
        &authorize_uri("&max_age=60&prompt=none"),
        &[("cookie", &header)],
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert_eq!(
        query_params(reply.location()).get("error").map(String::as_str),
        Some("login_required")
    );
}

#[tokio::test]
async fn garbage_cookies_fall_back_to_the_form() {
    let app = app();
    let reply = get_with(
        &app,
        &authorize_uri(""),
        &[("cookie", "ldgate_sso=not-a-token")],
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(!reply.login_session().is_empty());
}
