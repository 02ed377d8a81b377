//! 群组 HTTP API 客户端
//!
//! 负责所有群组相关的 HTTP 请求

use crate::sns::group::models::{Group, GroupMember};
use crate::sns::http::HttpApi;
use crate::sns::types::ApiResult;
use std::sync::Arc;
use tracing::info;

/// 群组相关的 HTTP API 客户端
pub struct GroupApi {
    http: Arc<HttpApi>,
}

impl GroupApi {
    /// 创建新的群组 API 客户端
    pub fn new(http: Arc<HttpApi>) -> Self {
        Self { http }
    }

    /// 获取所有群组（允许匿名）
    pub async fn get_groups(&self) -> ApiResult<Vec<Group>> {
        info!("[GroupAPI] 📡 请求群组列表");
        self.http.get("/groups").await
    }

    /// 获取当前用户加入的群组
    pub async fn get_my_groups(&self) -> ApiResult<Vec<Group>> {
        info!("[GroupAPI] 📡 请求我的群组列表");
        self.http.get("/groups/my").await
    }

    /// 按 ID 获取群组（允许匿名）
    pub async fn get_group_by_id(&self, group_id: &str) -> ApiResult<Group> {
        info!("[GroupAPI] 📡 请求群组详情: {}", group_id);
        self.http.get(&format!("/groups/{}", group_id)).await
    }

    /// 获取群组成员列表（允许匿名）
    pub async fn get_group_members(&self, group_id: &str) -> ApiResult<Vec<GroupMember>> {
        info!("[GroupAPI] 📡 请求群组成员: {}", group_id);
        self.http
            .get(&format!("/groups/{}/members", group_id))
            .await
    }

    /// 创建群组
    pub async fn create_group(
        &self,
        name: &str,
        description: &str,
        image_url: Option<&str>,
    ) -> ApiResult<Group> {
        info!("[GroupAPI] 📡 创建群组: {}", name);
        self.http
            .post(
                "/groups",
                serde_json::json!({
                    "name": name,
                    "description": description,
                    "imageUrl": image_url,
                }),
            )
            .await
    }

    /// 更新群组描述字段
    pub async fn update_group(
        &self,
        group_id: &str,
        name: &str,
        description: &str,
        image_url: Option<&str>,
    ) -> ApiResult<Group> {
        info!("[GroupAPI] 📡 更新群组: {}", group_id);
        self.http
            .put(
                &format!("/groups/{}", group_id),
                serde_json::json!({
                    "name": name,
                    "description": description,
                    "imageUrl": image_url,
                }),
            )
            .await
    }

    /// 删除群组
    pub async fn delete_group(&self, group_id: &str) -> ApiResult<serde_json::Value> {
        info!("[GroupAPI] 📡 删除群组: {}", group_id);
        self.http.delete(&format!("/groups/{}", group_id)).await
    }

    /// 加入群组
    pub async fn join_group(&self, group_id: &str) -> ApiResult<serde_json::Value> {
        info!("[GroupAPI] 📡 加入群组: {}", group_id);
        self.http
            .post(&format!("/groups/{}/join", group_id), serde_json::json!({}))
            .await
    }

    /// 退出群组
    pub async fn leave_group(&self, group_id: &str) -> ApiResult<serde_json::Value> {
        info!("[GroupAPI] 📡 退出群组: {}", group_id);
        self.http
            .post(&format!("/groups/{}/leave", group_id), serde_json::json!({}))
            .await
    }

    /// 设置群组管理员
    pub async fn make_admin(&self, group_id: &str, user_id: &str) -> ApiResult<serde_json::Value> {
        info!("[GroupAPI] 📡 设置管理员: group={}, user={}", group_id, user_id);
        self.http
            .post(
                &format!("/groups/{}/admins", group_id),
                serde_json::json!({ "userId": user_id }),
            )
            .await
    }

    /// 移除群组管理员
    pub async fn remove_admin(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ApiResult<serde_json::Value> {
        info!("[GroupAPI] 📡 移除管理员: group={}, user={}", group_id, user_id);
        self.http
            .delete(&format!("/groups/{}/admins/{}", group_id, user_id))
            .await
    }
}
