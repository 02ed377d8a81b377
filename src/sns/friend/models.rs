//! 好友本地模型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 好友申请状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
    Blocked,
}

/// 好友申请（服务器响应镜像）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: String,
    /// 发送方用户 ID
    #[serde(rename = "senderId")]
    pub sender_id: String,
    #[serde(rename = "senderName")]
    pub sender_name: String,
    #[serde(rename = "senderPhotoURL", default)]
    pub sender_photo_url: Option<String>,
    /// 接收方用户 ID（服务器字段名为 friend_id）
    #[serde(rename = "friend_id")]
    pub receiver_id: String,
    #[serde(rename = "receiverName", default)]
    pub receiver_name: String,
    #[serde(rename = "receiverPhotoURL", default)]
    pub receiver_photo_url: Option<String>,
    pub status: FriendRequestStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 好友（服务器响应镜像）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friend {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
