//! 好友 HTTP API 客户端
//!
//! 负责所有好友相关的 HTTP 请求

use crate::sns::friend::models::{Friend, FriendRequest, FriendRequestStatus};
use crate::sns::http::HttpApi;
use crate::sns::types::ApiResult;
use std::sync::Arc;
use tracing::info;

/// 好友相关的 HTTP API 客户端
pub struct FriendApi {
    http: Arc<HttpApi>,
}

impl FriendApi {
    /// 创建新的好友 API 客户端
    ///
    /// `http` 已经在外部配置好令牌附加和 401 刷新重试
    pub fn new(http: Arc<HttpApi>) -> Self {
        Self { http }
    }

    /// 获取好友申请列表
    pub async fn get_friend_requests(&self) -> ApiResult<Vec<FriendRequest>> {
        info!("[FriendAPI] 📡 请求好友申请列表");
        self.http.get("/friends/requests").await
    }

    /// 获取好友列表
    pub async fn get_friends(&self) -> ApiResult<Vec<Friend>> {
        info!("[FriendAPI] 📡 请求好友列表");
        self.http.get("/friends").await
    }

    /// 获取被当前用户屏蔽的用户 ID 列表
    pub async fn get_blocked_users(&self) -> ApiResult<Vec<String>> {
        info!("[FriendAPI] 📡 请求屏蔽列表");
        self.http.get("/friends/blocked").await
    }

    /// 发送好友申请
    pub async fn send_friend_request(&self, receiver_id: &str) -> ApiResult<FriendRequest> {
        info!("[FriendAPI] 📡 发送好友申请: friend_id={}", receiver_id);
        self.http
            .post(
                "/friends/requests",
                serde_json::json!({ "friend_id": receiver_id }),
            )
            .await
    }

    /// 响应好友申请（接受或拒绝）
    pub async fn respond_to_friend_request(
        &self,
        request_id: &str,
        status: FriendRequestStatus,
    ) -> ApiResult<FriendRequest> {
        info!(
            "[FriendAPI] 📡 响应好友申请: id={}, status={:?}",
            request_id, status
        );
        self.http
            .put(
                &format!("/friends/requests/{}", request_id),
                serde_json::json!({ "status": status }),
            )
            .await
    }

    /// 删除好友
    pub async fn unfriend(&self, friend_user_id: &str) -> ApiResult<serde_json::Value> {
        info!("[FriendAPI] 📡 删除好友: userId={}", friend_user_id);
        self.http
            .delete(&format!("/friends/{}", friend_user_id))
            .await
    }

    /// 屏蔽用户
    pub async fn block_user(
        &self,
        user_id: &str,
        user_name: &str,
    ) -> ApiResult<serde_json::Value> {
        info!("[FriendAPI] 📡 屏蔽用户: userId={}", user_id);
        self.http
            .post(
                "/friends/blocked",
                serde_json::json!({ "userId": user_id, "userName": user_name }),
            )
            .await
    }

    /// 取消屏蔽用户
    pub async fn unblock_user(&self, user_id: &str) -> ApiResult<serde_json::Value> {
        info!("[FriendAPI] 📡 取消屏蔽用户: userId={}", user_id);
        self.http
            .delete(&format!("/friends/blocked/{}", user_id))
            .await
    }
}
