//! 帖子本地模型定义
//!
//! 帖子接口的字段在服务器上是 snake_case，和好友/群组接口不同，
//! 这里按原样镜像。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 帖子可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Group,
}

/// 帖子（服务器响应镜像）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub content: String,
    #[serde(default)]
    pub media: Option<String>,
    pub author_id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub group_id: Option<String>,
    pub visibility: Visibility,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    /// 点赞用户 ID 列表（服务器可能不返回）
    #[serde(default)]
    pub user_likes: Option<Vec<String>>,
}

/// 评论（服务器响应镜像）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub post_id: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// `GET /posts` 的响应包装
#[derive(Debug, Deserialize)]
pub struct PostsResp {
    #[serde(deserialize_with = "crate::sns::types::deserialize_vec_or_null")]
    pub posts: Vec<Post>,
}

/// `GET /posts/:id/comments` 的响应包装
#[derive(Debug, Deserialize)]
pub struct CommentsResp {
    #[serde(deserialize_with = "crate::sns::types::deserialize_vec_or_null")]
    pub comments: Vec<Comment>,
}
