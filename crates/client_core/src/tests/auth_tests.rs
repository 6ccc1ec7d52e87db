use axum::{
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use super::*;
use crate::{
    config::ClientSettings,
    token_store::{MemoryTokenStore, TokenStore},
};

async fn handle_login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["captcha_value"] != "W7XK" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "captcha is wrong or expired" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": "jwt-admin",
            "token_type": "bearer",
            "user_id": 1,
            "username": "admin",
            "full_name": "Catalog Admin",
            "is_admin": true,
            "last_login": "2024-05-01T09:00:00"
        })),
    )
}

async fn handle_me(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some("Bearer jwt-admin");
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Could not validate credentials" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": 1,
            "username": "admin",
            "email": "admin@example.com",
            "full_name": "Catalog Admin",
            "is_admin": true,
            "last_login": null
        })),
    )
}

async fn spawn_auth_server() -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/api/auth/login", post(handle_login))
        .route("/api/auth/me", get(handle_me));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/api"))
}

fn session_for(base_url: String, tokens: Arc<MemoryTokenStore>) -> AuthSession {
    let settings = ClientSettings {
        api_base_url: base_url,
        ..ClientSettings::default()
    };
    AuthSession::new(ApiClient::new(&settings, tokens).expect("client"))
}

fn credentials(captcha_value: &str) -> LoginRequest {
    LoginRequest {
        username: "admin".into(),
        password: "secret".into(),
        captcha_key: "key-1".into(),
        captcha_value: captcha_value.into(),
    }
}

#[tokio::test]
async fn login_persists_token_and_user() {
    let base_url = spawn_auth_server().await.expect("spawn server");
    let tokens = Arc::new(MemoryTokenStore::default());
    let session = session_for(base_url, tokens.clone());

    let user = session.login(&credentials("W7XK")).await.expect("login");

    assert_eq!(user.username, "admin");
    assert!(user.is_admin);
    assert_eq!(tokens.load().as_deref(), Some("jwt-admin"));
    assert!(session.is_authenticated().await);
    assert!(session.check_auth().await);
}

#[tokio::test]
async fn failed_login_leaves_session_empty() {
    let base_url = spawn_auth_server().await.expect("spawn server");
    let tokens = Arc::new(MemoryTokenStore::default());
    let session = session_for(base_url, tokens.clone());

    let err = session
        .login(&credentials("nope"))
        .await
        .expect_err("bad captcha");

    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(err.message, "captcha is wrong or expired");
    assert_eq!(tokens.load(), None);
    assert_eq!(session.current_user().await, None);
}

#[tokio::test]
async fn check_auth_without_token_skips_the_server() {
    let session = session_for(
        "http://127.0.0.1:9/api".to_string(),
        Arc::new(MemoryTokenStore::default()),
    );
    assert!(!session.check_auth().await);
}

#[tokio::test]
async fn rejected_token_is_cleared() {
    let base_url = spawn_auth_server().await.expect("spawn server");
    let tokens = Arc::new(MemoryTokenStore::with_token("stale"));
    let session = session_for(base_url, tokens.clone());

    assert!(!session.check_auth().await);
    assert_eq!(tokens.load(), None);
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn logout_clears_everything() {
    let base_url = spawn_auth_server().await.expect("spawn server");
    let tokens = Arc::new(MemoryTokenStore::default());
    let session = session_for(base_url, tokens.clone());
    session.login(&credentials("W7XK")).await.expect("login");

    session.logout().await;
    assert_eq!(tokens.load(), None);
    assert_eq!(session.current_user().await, None);
}
