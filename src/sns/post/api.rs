//! 帖子 HTTP API 客户端
//!
//! 负责所有帖子和评论相关的 HTTP 请求

use crate::sns::http::HttpApi;
use crate::sns::post::models::{Comment, CommentsResp, Post, PostsResp, Visibility};
use crate::sns::types::ApiResult;
use std::sync::Arc;
use tracing::info;

/// 帖子相关的 HTTP API 客户端
pub struct PostApi {
    http: Arc<HttpApi>,
}

impl PostApi {
    /// 创建新的帖子 API 客户端
    pub fn new(http: Arc<HttpApi>) -> Self {
        Self { http }
    }

    /// 获取帖子列表（允许匿名，响应为 `{ "posts": [...] }`）
    pub async fn get_posts(&self) -> ApiResult<PostsResp> {
        info!("[PostAPI] 📡 请求帖子列表");
        self.http.get("/posts").await
    }

    /// 创建帖子
    ///
    /// 仅当可见性为 `Group` 时携带 `group_id`，否则传 null
    pub async fn create_post(
        &self,
        content: &str,
        visibility: Visibility,
        group_id: Option<&str>,
        media: Option<&str>,
    ) -> ApiResult<Post> {
        info!("[PostAPI] 📡 创建帖子, visibility={:?}", visibility);
        let group_id = if visibility == Visibility::Group {
            group_id
        } else {
            None
        };
        self.http
            .post(
                "/posts",
                serde_json::json!({
                    "content": content,
                    "media": media,
                    "visibility": visibility,
                    "group_id": group_id,
                }),
            )
            .await
    }

    /// 更新帖子
    pub async fn update_post(
        &self,
        post_id: &str,
        content: &str,
        visibility: Visibility,
        group_id: Option<&str>,
        media: Option<&str>,
    ) -> ApiResult<Post> {
        info!("[PostAPI] 📡 更新帖子: {}", post_id);
        let group_id = if visibility == Visibility::Group {
            group_id
        } else {
            None
        };
        self.http
            .put(
                &format!("/posts/{}", post_id),
                serde_json::json!({
                    "content": content,
                    "media": media,
                    "visibility": visibility,
                    "group_id": group_id,
                }),
            )
            .await
    }

    /// 删除帖子
    pub async fn delete_post(&self, post_id: &str) -> ApiResult<serde_json::Value> {
        info!("[PostAPI] 📡 删除帖子: {}", post_id);
        self.http.delete(&format!("/posts/{}", post_id)).await
    }

    /// 点赞帖子
    pub async fn like_post(&self, post_id: &str) -> ApiResult<serde_json::Value> {
        info!("[PostAPI] 📡 点赞帖子: {}", post_id);
        self.http
            .post(&format!("/posts/{}/like", post_id), serde_json::json!({}))
            .await
    }

    /// 取消点赞
    pub async fn unlike_post(&self, post_id: &str) -> ApiResult<serde_json::Value> {
        info!("[PostAPI] 📡 取消点赞: {}", post_id);
        self.http.delete(&format!("/posts/{}/like", post_id)).await
    }

    /// 获取帖子评论（允许匿名，响应为 `{ "comments": [...] }`）
    pub async fn get_comments(&self, post_id: &str) -> ApiResult<CommentsResp> {
        info!("[PostAPI] 📡 请求帖子评论: {}", post_id);
        self.http
            .get(&format!("/posts/{}/comments", post_id))
            .await
    }

    /// 添加评论
    pub async fn add_comment(&self, post_id: &str, content: &str) -> ApiResult<Comment> {
        info!("[PostAPI] 📡 添加评论: post={}", post_id);
        self.http
            .post(
                &format!("/posts/{}/comments", post_id),
                serde_json::json!({ "content": content }),
            )
            .await
    }
}
