use std::collections::HashMap;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::error::ErrorCode;
use tokio::net::TcpListener;

use super::*;
use crate::{config::ClientSettings, token_store::MemoryTokenStore};

fn notification_json(id: i64, is_read: bool) -> Value {
    json!({
        "id": id,
        "title": format!("Price drop #{id}"),
        "content": "A tracked product got cheaper",
        "is_read": is_read,
        "user_id": 1,
        "created_at": "2024-03-01T12:00:00"
    })
}

async fn handle_list(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let all = [
        notification_json(1, false),
        notification_json(2, true),
        notification_json(3, false),
    ];
    let items: Vec<Value> = match params.get("is_read").map(String::as_str) {
        Some("false") => all.into_iter().filter(|n| n["is_read"] == false).collect(),
        _ => all.into_iter().collect(),
    };
    Json(Value::Array(items))
}

async fn handle_mark_read(Path(id): Path<i64>) -> Json<Value> {
    Json(notification_json(id, true))
}

async fn handle_mark_all() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn handle_delete(Path(id): Path<i64>) -> (StatusCode, Json<Value>) {
    if id == 99 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Notification not found" })),
        );
    }
    (StatusCode::OK, Json(json!({ "message": "deleted" })))
}

async fn inbox() -> NotificationInbox {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/api/notifications", get(handle_list))
        .route("/api/notifications/read-all", put(handle_mark_all))
        .route("/api/notifications/:id/read", put(handle_mark_read))
        .route("/api/notifications/:id", delete(handle_delete));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let settings = ClientSettings {
        api_base_url: format!("http://{addr}/api"),
        ..ClientSettings::default()
    };
    let tokens = Arc::new(MemoryTokenStore::with_token("jwt-admin"));
    NotificationInbox::new(ApiClient::new(&settings, tokens).expect("client"))
}

#[tokio::test]
async fn refresh_counts_unread() {
    let inbox = inbox().await;
    let state = inbox.refresh(false).await.expect("refresh");
    assert_eq!(state.notifications.len(), 3);
    assert_eq!(state.unread_count, 2);

    let unread = inbox.refresh(true).await.expect("refresh unread");
    assert_eq!(unread.notifications.len(), 2);
    assert!(unread.notifications.iter().all(|n| !n.is_read));
}

#[tokio::test]
async fn mark_read_updates_local_copy() {
    let inbox = inbox().await;
    inbox.refresh(false).await.expect("refresh");

    inbox.mark_read(NotificationId(1)).await.expect("mark read");
    assert_eq!(inbox.unread_count().await, 1);

    inbox.mark_all_read().await.expect("mark all");
    let state = inbox.state().await;
    assert_eq!(state.unread_count, 0);
    assert!(state.notifications.iter().all(|n| n.is_read));
}

#[tokio::test]
async fn failed_delete_keeps_the_notification() {
    let inbox = inbox().await;
    inbox.refresh(false).await.expect("refresh");

    let err = inbox.delete(NotificationId(99)).await.expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
    assert_eq!(err.message, "Notification not found");
    assert_eq!(inbox.state().await.notifications.len(), 3);

    inbox.delete(NotificationId(3)).await.expect("delete");
    let state = inbox.state().await;
    assert_eq!(state.notifications.len(), 2);
    assert_eq!(state.unread_count, 1);
}
