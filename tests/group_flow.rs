//! 群组流程集成测试

mod common;

use axum::extract::Json as ExtractJson;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::spawn_server;
use sns_sdk_core_rust::sns::group::GroupStore;
use sns_sdk_core_rust::sns::http::HttpApi;
use sns_sdk_core_rust::sns::session::{EmptySessionExpiredHandler, MemorySession};
use std::sync::Arc;

fn group_json(id: &str, members: &[&str], admins: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": "摄影爱好者",
        "description": "分享照片",
        "imageUrl": null,
        "createdAt": "2026-08-01T10:00:00Z",
        "createdBy": "u_owner",
        "creatorName": "群主",
        "members": members,
        "admins": admins
    })
}

fn authed_store(base_url: &str) -> GroupStore {
    let session = Arc::new(MemorySession::authenticated(
        base_url.to_string(),
        "u_me",
        "token-ok",
        "refresh-ok",
    ));
    let http = Arc::new(HttpApi::new(
        base_url.to_string(),
        session.clone(),
        Arc::new(EmptySessionExpiredHandler),
    ));
    GroupStore::new(http, session)
}

#[tokio::test]
async fn create_group_mirrors_server_record_verbatim() {
    // 服务器返回的成员列表为空：客户端不得自作主张把创建者塞进去
    let app = Router::new().route(
        "/groups",
        post(|ExtractJson(body): ExtractJson<serde_json::Value>| async move {
            let mut group = group_json("g_new", &[], &[]);
            group["name"] = body["name"].clone();
            Json(group)
        }),
    );
    let base_url = spawn_server(app).await;
    let store = authed_store(&base_url);

    let created = store.create_group("摄影爱好者", "分享照片", None).await;
    assert!(created.is_some());
    assert!(created.unwrap().members.is_empty());

    assert_eq!(store.groups().len(), 1);
    assert_eq!(store.my_groups().len(), 1);
    assert!(!store.is_group_member("g_new"));
}

#[tokio::test]
async fn join_and_leave_update_membership_views() {
    let app = Router::new()
        .route(
            "/groups",
            get(|| async { Json(serde_json::json!([group_json("g1", &["u_other"], &["u_other"])])) }),
        )
        .route(
            "/groups/{id}/join",
            post(|| async { Json(serde_json::json!({"ok": true})) }),
        )
        .route(
            "/groups/{id}/leave",
            post(|| async { Json(serde_json::json!({"ok": true})) }),
        );
    let base_url = spawn_server(app).await;
    let store = authed_store(&base_url);

    assert!(store.fetch_groups().await);
    assert!(!store.is_group_member("g1"));

    assert!(store.join_group("g1").await);
    assert!(store.is_group_member("g1"));
    assert!(store.my_groups().iter().any(|g| g.id == "g1"));
    assert_eq!(store.user_groups().len(), 1);

    assert!(store.leave_group("g1").await);
    assert!(!store.is_group_member("g1"));
    assert!(store.my_groups().is_empty());
}

#[tokio::test]
async fn fetch_groups_is_allowed_without_session() {
    let app = Router::new().route(
        "/groups",
        get(|| async { Json(serde_json::json!([group_json("g1", &["u_other"], &[])])) }),
    );
    let base_url = spawn_server(app).await;

    let session = Arc::new(MemorySession::new(base_url.clone()));
    let http = Arc::new(HttpApi::new(
        base_url,
        session.clone(),
        Arc::new(EmptySessionExpiredHandler),
    ));
    let store = GroupStore::new(http, session);

    // 群组列表是公开数据，匿名也能浏览
    assert!(store.fetch_groups().await);
    assert_eq!(store.groups().len(), 1);
    // 但成员判断在未登录时恒为否
    assert!(!store.is_group_member("g1"));
}

#[tokio::test]
async fn null_member_lists_deserialize_as_empty() {
    let app = Router::new().route(
        "/groups",
        get(|| async {
            let mut group = group_json("g1", &[], &[]);
            group["members"] = serde_json::Value::Null;
            group["admins"] = serde_json::Value::Null;
            Json(serde_json::json!([group]))
        }),
    );
    let base_url = spawn_server(app).await;
    let store = authed_store(&base_url);

    assert!(store.fetch_groups().await);
    let groups = store.groups();
    assert!(groups[0].members.is_empty());
    assert!(groups[0].admins.is_empty());
}
