//! Authorization code flow, end to end.

use axum::http::StatusCode;
use ldgate_token::left_half_hash;

use crate::harness::{
    app, authorize_uri, get, get_with, login, post_form, query_params, token_manager,
    CLI1_REDIRECT, ISSUER,
};

#[tokio::test]
async fn authorization_code_flow_end_to_end() {
    let app = app();

    // Login form, then credentials.
    let reply = login(&app, &authorize_uri(""), "alice", "secret").await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert!(reply.cookie("ldgate_sso").is_some(), "SSO cookie must be set");

    let location = reply.location().to_string();
    assert!(
        location.starts_with("https://app.example.com/cb?"),
        "code flow results belong in the query: {location}"
    );
    assert!(!location.contains('#'));

    let params = query_params(&location);
    let code = params.get("code").expect("code in redirect").clone();
    assert_eq!(params.get("state").map(String::as_str), Some("xyz"));

    // Exchange the code.
    let reply = post_form(
        &app,
        "/login/token",
        &[
            ("grant_type", "authorization_code"),
            ("code", &code),
            ("redirect_uri", CLI1_REDIRECT),
            ("client_id", "cli1"),
        ],
        &[],
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(
        reply.headers.get("cache-control").unwrap().to_str().unwrap(),
        "no-store"
    );

    let json = reply.json();
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["expires_in"], 604_800);
    assert_eq!(json["scope"], "openid profile");

    let access_token = json["access_token"].as_str().unwrap();
    let access = token_manager().parse_access_token(access_token).unwrap();
    assert_eq!(access.sub, "alice");
    assert_eq!(access.aud, "cli1");
    assert_eq!(access.scope, "openid profile");

    let id_token = json["id_token"].as_str().unwrap();
    let id = token_manager().parse_id_token(id_token).unwrap();
    assert_eq!(id.iss, ISSUER);
    assert_eq!(id.aud, "cli1");
    assert_eq!(id.sub, "alice");
    assert_eq!(id.extra["name"], "Alice Armstrong");
    assert_eq!(id.at_hash.as_deref(), Some(left_half_hash(access_token)).as_deref());
}

#[tokio::test]
async fn wrong_credentials_re_render_the_form_once() {
    let app = app();
    let reply = login(&app, &authorize_uri(""), "alice", "wrong-password").await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(reply.body.contains("invalid username or password"));
    // The request survives into the re-rendered form.
    assert!(!reply.login_session().is_empty());
}

#[tokio::test]
async fn unregistered_redirect_uri_is_refused_without_redirecting() {
    let app = app();
    let reply = get(
        &app,
        "/login?response_type=code&client_id=cli1&redirect_uri=https%3A%2F%2Fevil.example.com%2F&scope=openid&state=xyz",
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.headers.get("location").is_none(), "must not redirect");
    assert!(reply.body.contains("Authorization Error"));
}

#[tokio::test]
async fn unknown_client_is_refused_without_redirecting() {
    let app = app();
    let reply = get_with(
        &app,
        "/login?response_type=code&client_id=nobody&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb&scope=openid",
        &[("accept", "application/json")],
    )
    .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(reply.headers.get("location").is_none());
    assert_eq!(reply.json()["error"], "unauthorized_client");
}

#[tokio::test]
async fn invalid_scope_redirects_back_to_the_client() {
    let app = app();
    let reply = get(
        &app,
        "/login?response_type=code&client_id=cli1&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb&scope=openid+admin&state=xyz",
    )
    .await;

    assert_eq!(reply.status, StatusCode::FOUND);
    let params = query_params(reply.location());
    assert_eq!(params.get("error").map(String::as_str), Some("invalid_scope"));
    assert_eq!(params.get("state").map(String::as_str), Some("xyz"));
}

#[tokio::test]
async fn post_authorize_merges_query_and_form_parameters() {
    let app = app();
    // scope arrives in the body, the rest in the query.
    let reply = post_form(
        &app,
        "/login?response_type=code&client_id=cli1&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb&state=xyz",
        &[("scope", "openid profile")],
        &[],
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(!reply.login_session().is_empty());
}
