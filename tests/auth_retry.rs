//! 认证重试协议集成测试
//!
//! 用内嵌桩服务器验证 401 → 刷新令牌 → 重放一次的完整流程。

mod common;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{bearer_token, spawn_server};
use sns_sdk_core_rust::sns::http::HttpApi;
use sns_sdk_core_rust::sns::session::{
    EmptySessionExpiredHandler, MemorySession, SessionExpiredHandler, SessionProvider,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

struct StubState {
    friends_hits: AtomicUsize,
    refresh_hits: AtomicUsize,
    /// 只有这个令牌被接受，其他令牌一律 401
    accepted_token: &'static str,
    /// 刷新接口下发的新令牌（可以和接受的令牌不同，用来模拟刷新后仍被拒绝）
    refreshed_token: &'static str,
    /// 刷新接口是否返回失败
    refresh_fails: bool,
}

async fn friends_handler(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.friends_hits.fetch_add(1, Ordering::SeqCst);
    if bearer_token(&headers).as_deref() == Some(state.accepted_token) {
        Json(serde_json::json!([
            {"id": "f1", "userId": "u_friend", "displayName": "朋友"}
        ]))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"message": "令牌无效"})),
        )
            .into_response()
    }
}

async fn refresh_handler(State(state): State<Arc<StubState>>) -> Response {
    state.refresh_hits.fetch_add(1, Ordering::SeqCst);
    if state.refresh_fails {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"message": "刷新令牌已失效"})),
        )
            .into_response()
    } else {
        Json(serde_json::json!({"accessToken": state.refreshed_token})).into_response()
    }
}

fn stub_app(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/friends", get(friends_handler))
        .route("/auth/refresh", post(refresh_handler))
        .with_state(state)
}

struct ExpiredFlag(Arc<AtomicBool>);

#[async_trait::async_trait]
impl SessionExpiredHandler for ExpiredFlag {
    async fn on_session_expired(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn refreshes_and_replays_exactly_once_on_401() {
    let state = Arc::new(StubState {
        friends_hits: AtomicUsize::new(0),
        refresh_hits: AtomicUsize::new(0),
        accepted_token: "token-new",
        refreshed_token: "token-new",
        refresh_fails: false,
    });
    let base_url = spawn_server(stub_app(state.clone())).await;

    // 过期令牌触发 401
    let session = Arc::new(MemorySession::authenticated(
        base_url.clone(),
        "u_me",
        "token-stale",
        "refresh-ok",
    ));
    let http = HttpApi::new(base_url, session.clone(), Arc::new(EmptySessionExpiredHandler));

    let resp = http.get::<serde_json::Value>("/friends").await;
    assert!(resp.is_ok(), "刷新后重放应当成功: {:?}", resp.error);
    assert_eq!(resp.data.unwrap().as_array().unwrap().len(), 1);

    // 原请求 + 重放 = 恰好两次，刷新恰好一次
    assert_eq!(state.friends_hits.load(Ordering::SeqCst), 2);
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 1);
    // 新令牌写回会话
    assert_eq!(session.access_token().as_deref(), Some("token-new"));
}

#[tokio::test]
async fn second_401_after_refresh_is_terminal() {
    // 刷新下发的令牌仍然不被接受：重放后再次 401，不允许二次刷新
    let state = Arc::new(StubState {
        friends_hits: AtomicUsize::new(0),
        refresh_hits: AtomicUsize::new(0),
        accepted_token: "token-nobody-gets",
        refreshed_token: "token-still-bad",
        refresh_fails: false,
    });
    let base_url = spawn_server(stub_app(state.clone())).await;

    let session = Arc::new(MemorySession::authenticated(
        base_url.clone(),
        "u_me",
        "token-stale",
        "refresh-ok",
    ));
    let http = HttpApi::new(base_url, session, Arc::new(EmptySessionExpiredHandler));

    let resp = http.get::<serde_json::Value>("/friends").await;
    assert!(!resp.is_ok());
    assert_eq!(resp.status, Some(401));

    assert_eq!(state.friends_hits.load(Ordering::SeqCst), 2);
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn refresh_failure_fires_session_expired_handler() {
    let state = Arc::new(StubState {
        friends_hits: AtomicUsize::new(0),
        refresh_hits: AtomicUsize::new(0),
        accepted_token: "token-new",
        refreshed_token: "token-new",
        refresh_fails: true,
    });
    let base_url = spawn_server(stub_app(state.clone())).await;

    let session = Arc::new(MemorySession::authenticated(
        base_url.clone(),
        "u_me",
        "token-stale",
        "refresh-dead",
    ));
    let expired = Arc::new(AtomicBool::new(false));
    let http = HttpApi::new(base_url, session, Arc::new(ExpiredFlag(expired.clone())));

    let resp = http.get::<serde_json::Value>("/friends").await;
    assert!(!resp.is_ok());
    assert!(expired.load(Ordering::SeqCst), "刷新失败必须触发会话过期回调");

    // 刷新失败后不重放原请求
    assert_eq!(state.friends_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn network_error_becomes_api_result() {
    // 指向没有监听的端口，网络错误也必须是 ApiResult 而不是 panic
    let session = Arc::new(MemorySession::authenticated(
        "http://127.0.0.1:9".to_string(),
        "u_me",
        "token",
        "refresh",
    ));
    let http = HttpApi::new(
        "http://127.0.0.1:9".to_string(),
        session,
        Arc::new(EmptySessionExpiredHandler),
    );

    let resp = http.get::<serde_json::Value>("/friends").await;
    assert!(!resp.is_ok());
    assert!(resp.status.is_none());
    assert!(resp.error.is_some());
}
