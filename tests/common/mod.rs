#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use taskflow::{build_app, config::PasswordConfig, AppConfig, AppState};

pub fn test_config() -> AppConfig {
    AppConfig {
        password: PasswordConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        },
        ..AppConfig::default()
    }
}

/// Fresh app over its own in-memory store, plus the state behind it.
pub fn test_app_with_state() -> (Router, AppState) {
    let state = AppState::in_memory(test_config()).expect("state");
    let app = build_app(state.clone()).expect("router");
    (app, state)
}

pub fn test_app() -> Router {
    test_app_with_state().0
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply { status, headers, body }
}

pub async fn signup(app: &Router, username: &str, email: &str, password: &str) -> Reply {
    let body = json!({ "username": username, "email": email, "password": password });
    send(app, Method::POST, "/api/auth/signup", None, Some(body)).await
}

/// Logs in and returns the `name=value` pair to send back as a Cookie header.
pub async fn login(app: &Router, email: &str, password: &str) -> String {
    login_with(app, email, password, None).await
}

pub async fn login_with(app: &Router, email: &str, password: &str, cookie: Option<&str>) -> String {
    let body = json!({ "email": email, "password": password });
    let res = send(app, Method::POST, "/api/auth/login", cookie, Some(body)).await;
    assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.body);
    session_cookie(&res.headers).expect("session cookie")
}

pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("taskflow.sid="))
        .map(|v| v.split(';').next().unwrap_or_default().to_owned())
}

pub async fn user_with_session(app: &Router, name: &str) -> String {
    let email = format!("{name}@x.com");
    assert_eq!(signup(app, name, &email, "secret1").await.status, StatusCode::CREATED);
    login(app, &email, "secret1").await
}

/// Number of fractional-second digits in an RFC 3339 timestamp.
pub fn fraction_digits(ts: &Value) -> usize {
    let s = ts.as_str().expect("timestamp string");
    match s.split_once('.') {
        Some((_, rest)) => rest.chars().take_while(|c| c.is_ascii_digit()).count(),
        None => 0,
    }
}
