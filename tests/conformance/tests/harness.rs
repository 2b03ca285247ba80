//! Test harness: an in-process router over a scripted directory.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use ldgate_core::{AppConfig, RegisteredClient};
use ldgate_oidc::{router, AppState, DirectoryError, DirectoryProvider};
use ldgate_token::{SigningKey, TokenManager, TokenTtl};

/// Issuer shared by every test.
pub const ISSUER: &str = "http://localhost:8000";

/// Registered redirect target of `cli1`.
pub const CLI1_REDIRECT: &str = "https://app.example.com/cb";

/// One scripted directory user.
struct MockUser {
    password: &'static str,
    attributes: HashMap<String, Vec<String>>,
}

/// In-memory stand-in for the LDAP connector.
pub struct MockDirectory {
    users: HashMap<&'static str, MockUser>,
}

impl MockDirectory {
    fn seeded() -> Self {
        let mut attributes = HashMap::new();
        attributes.insert(
            "displayName".to_string(),
            vec!["Alice Armstrong".to_string()],
        );
        attributes.insert("givenName".to_string(), vec!["Alice".to_string()]);
        attributes.insert("sn".to_string(), vec!["Armstrong".to_string()]);
        attributes.insert("mail".to_string(), vec!["alice@example.com".to_string()]);
        attributes.insert(
            "memberOf".to_string(),
            vec![
                "cn=dev,ou=groups,dc=example,dc=com".to_string(),
                "cn=ops,ou=groups,dc=example,dc=com".to_string(),
            ],
        );

        let mut users = HashMap::new();
        users.insert(
            "alice",
            MockUser {
                password: "secret",
                attributes,
            },
        );
        Self { users }
    }
}

#[async_trait]
impl DirectoryProvider for MockDirectory {
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), DirectoryError> {
        match self.users.get(username) {
            Some(user) if user.password == password => Ok(()),
            _ => Err(DirectoryError::InvalidCredentials),
        }
    }

    async fn user_attributes(
        &self,
        username: &str,
        attributes: &[String],
    ) -> Result<HashMap<String, Vec<String>>, DirectoryError> {
        let user = self.users.get(username).ok_or(DirectoryError::NotFound)?;
        Ok(user
            .attributes
            .iter()
            .filter(|(name, _)| attributes.contains(name))
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect())
    }
}

/// One shared RSA key: generation is expensive, identity is irrelevant.
pub fn signing_key() -> SigningKey {
    static KEY: OnceLock<SigningKey> = OnceLock::new();
    KEY.get_or_init(|| SigningKey::generate().unwrap()).clone()
}

/// Two registered clients; `cli1` carries a CORS origin.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.clients.insert(
        "cli1".to_string(),
        RegisteredClient {
            secret: "cli1-secret".to_string(),
            redirect_uris: vec!["https://app.example.com/*".to_string()],
            cors_origin: Some("https://app.example.com".to_string()),
        },
    );
    config.clients.insert(
        "cli2".to_string(),
        RegisteredClient {
            secret: "cli2-secret".to_string(),
            redirect_uris: vec!["https://other.example.com/*".to_string()],
            cors_origin: None,
        },
    );
    config
}

/// Token manager matching the app under test, for minting and decoding.
pub fn token_manager() -> TokenManager {
    manager_for(&test_config())
}

/// Token manager with the shared key and a config's lifetimes.
pub fn manager_for(config: &AppConfig) -> TokenManager {
    let ttl = TokenTtl::from_secs(
        config.ttl.code as i64,
        config.ttl.token as i64,
        config.ttl.sso as i64,
    );
    TokenManager::new(config.issuer_str(), signing_key(), ttl)
}

/// The app under test with the default test config.
pub fn app() -> Router {
    app_with(test_config())
}

/// The app under test with a custom config.
pub fn app_with(config: AppConfig) -> Router {
    let tokens = manager_for(&config);
    let state = AppState::new(
        Arc::new(config),
        Arc::new(tokens),
        Arc::new(MockDirectory::seeded()),
    );
    router(state)
}

/// A captured response: status, headers, body.
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    /// The `Location` header.
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .expect("missing Location header")
            .to_str()
            .unwrap()
    }

    /// Value of the named cookie from `Set-Cookie`, if any.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| {
                let rest = value.strip_prefix(&prefix)?;
                Some(rest.split(';').next().unwrap_or(rest).to_string())
            })
    }

    /// The JSON body.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("body is not JSON")
    }

    /// The hidden login-session token from the login form.
    pub fn login_session(&self) -> String {
        let marker = "name=\"session\" value=\"";
        let start = self.body.find(marker).expect("no session field in body") + marker.len();
        let end = self.body[start..].find('"').expect("unterminated session value") + start;
        self.body[start..end].to_string()
    }
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    Reply {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// GET without extra headers.
pub async fn get(app: &Router, uri: &str) -> Reply {
    get_with(app, uri, &[]).await
}

/// GET with extra headers.
pub async fn get_with(app: &Router, uri: &str, headers: &[(&str, &str)]) -> Reply {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

/// POST a form body, with extra headers.
pub async fn post_form(
    app: &Router,
    uri: &str,
    form: &[(&str, &str)],
    headers: &[(&str, &str)],
) -> Reply {
    let body = serde_urlencoded::to_string(form).unwrap();
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::from(body)).unwrap()).await
}

/// Query parameters of a redirect URL.
pub fn query_params(url: &str) -> HashMap<String, String> {
    let raw = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
    let raw = raw.split('#').next().unwrap_or_default();
    decode_pairs(raw)
}

/// Fragment parameters of a redirect URL.
pub fn fragment_params(url: &str) -> HashMap<String, String> {
    let raw = url.split_once('#').map(|(_, f)| f).unwrap_or_default();
    decode_pairs(raw)
}

fn decode_pairs(raw: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(raw)
        .unwrap_or_default()
        .into_iter()
        .collect()
}

/// Runs the interactive login against `/login` and returns the final 302.
pub async fn login(app: &Router, authorize_uri: &str, username: &str, password: &str) -> Reply {
    login_with_cookie(app, authorize_uri, username, password, None).await
}

/// Interactive login carrying an existing SSO cookie.
pub async fn login_with_cookie(
    app: &Router,
    authorize_uri: &str,
    username: &str,
    password: &str,
    cookie: Option<&str>,
) -> Reply {
    let cookie_line = cookie.map(|value| format!("ldgate_sso={value}"));
    let mut headers: Vec<(&str, &str)> = Vec::new();
    if let Some(line) = &cookie_line {
        headers.push(("cookie", line));
    }

    let form_page = get_with(app, authorize_uri, &headers).await;
    assert_eq!(form_page.status, StatusCode::OK, "{}", form_page.body);
    let session = form_page.login_session();

    post_form(
        app,
        "/login",
        &[
            ("session", session.as_str()),
            ("username", username),
            ("password", password),
        ],
        &headers,
    )
    .await
}

/// The standard code-flow authorize URI for `cli1`.
pub fn authorize_uri(extra: &str) -> String {
    format!(
        "/login?response_type=code&client_id=cli1&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb&scope=openid+profile&state=xyz{extra}"
    )
}
