//! SNS 客户端核心实现模块
//!
//! 组装会话、认证 HTTP 层和三个领域状态容器，
//! 是宿主应用使用本 SDK 的统一入口。

use crate::sns::friend::{FriendListener, FriendStore};
use crate::sns::group::{GroupListener, GroupStore};
use crate::sns::http::HttpApi;
use crate::sns::post::{PostListener, PostStore};
use crate::sns::session::{EmptySessionExpiredHandler, MemorySession, SessionExpiredHandler};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// HTTP API 基础地址，例如 `http://localhost:3000/api`
    pub api_base_url: String,
}

impl ClientConfig {
    /// 创建配置
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
        }
    }

    /// 从环境变量读取配置
    ///
    /// `SNS_API_BASE_URL` 未设置时使用本地开发默认值。
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("SNS_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api".to_string());
        Self { api_base_url }
    }
}

/// SNS 客户端
///
/// 所有状态容器共享同一个会话和同一个 HTTP 层，
/// 令牌刷新对各容器透明。
pub struct SnsClient {
    config: ClientConfig,
    session: Arc<MemorySession>,
    /// 好友状态容器
    pub friend: FriendStore,
    /// 群组状态容器
    pub group: GroupStore,
    /// 帖子状态容器
    pub post: PostStore,
}

impl SnsClient {
    /// 创建新的客户端（会话过期时默认不做任何处理）
    pub fn new(config: ClientConfig) -> Self {
        Self::with_session_expired_handler(config, Arc::new(EmptySessionExpiredHandler))
    }

    /// 创建新的客户端并注入会话过期回调
    pub fn with_session_expired_handler(
        config: ClientConfig,
        expired_handler: Arc<dyn SessionExpiredHandler>,
    ) -> Self {
        let session = Arc::new(MemorySession::new(config.api_base_url.clone()));
        let http = Arc::new(HttpApi::new(
            config.api_base_url.clone(),
            session.clone(),
            expired_handler,
        ));

        Self {
            config,
            session: session.clone(),
            friend: FriendStore::new(http.clone(), session.clone()),
            group: GroupStore::new(http.clone(), session.clone()),
            post: PostStore::new(http, session),
        }
    }

    /// 客户端配置
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 会话引用（读取用户 ID / 登录状态）
    pub fn session(&self) -> &Arc<MemorySession> {
        &self.session
    }

    /// 登录并初始化会话
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        info!("[Client] 🔗 登录到 SNS Server: {}", self.config.api_base_url);
        self.session.login(email, password).await
    }

    /// 登出并清空会话
    pub fn logout(&self) {
        self.session.clear();
        info!("[Client] 👋 已登出");
    }

    /// 注册好友监听器
    pub fn set_friend_listener(&self, listener: Arc<dyn FriendListener>) {
        self.friend.set_listener(listener);
    }

    /// 注册群组监听器
    pub fn set_group_listener(&self, listener: Arc<dyn GroupListener>) {
        self.group.set_listener(listener);
    }

    /// 注册帖子监听器
    pub fn set_post_listener(&self, listener: Arc<dyn PostListener>) {
        self.post.set_listener(listener);
    }
}
