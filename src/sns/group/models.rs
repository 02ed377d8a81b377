//! 群组本地模型定义

use crate::sns::types::deserialize_vec_or_null;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 群组（服务器响应镜像）
///
/// `members` / `admins` 是成员关系的权威本地表示；
/// 管理员应为成员的子集，但客户端不做强制。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "createdBy")]
    pub created_by: String,
    #[serde(rename = "creatorName", default)]
    pub creator_name: String,
    #[serde(deserialize_with = "deserialize_vec_or_null", default)]
    pub members: Vec<String>,
    #[serde(deserialize_with = "deserialize_vec_or_null", default)]
    pub admins: Vec<String>,
}

/// 群组成员（展示缓存，按群组 ID 分组保存）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(rename = "joinedAt")]
    pub joined_at: DateTime<Utc>,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}
