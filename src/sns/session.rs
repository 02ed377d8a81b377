//! 会话层
//!
//! 定义会话提供者接口 `SessionProvider` 和会话过期回调接口
//! `SessionExpiredHandler`，并提供一个内存会话实现 `MemorySession`。
//! 所有状态容器都通过构造函数注入会话提供者，避免隐藏的全局状态。

use crate::sns::auth;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::RwLock;
use tracing::{info, warn};

/// 会话提供者接口
///
/// 暴露当前用户 ID、当前访问令牌以及令牌刷新操作。
/// HTTP 封装层在收到 401 时调用 `refresh_access_token` 并重放一次请求。
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// 当前登录用户 ID（未登录时为 None）
    fn user_id(&self) -> Option<String>;

    /// 当前访问令牌（未登录时为 None）
    fn access_token(&self) -> Option<String>;

    /// 刷新访问令牌，成功时返回新令牌
    async fn refresh_access_token(&self) -> Result<String>;
}

/// 会话过期回调接口
///
/// 令牌刷新失败（不可恢复的认证失败）时由 HTTP 封装层触发，
/// 由宿主应用决定如何处理（例如跳转登录页）。
#[async_trait]
pub trait SessionExpiredHandler: Send + Sync {
    /// 会话已过期且无法刷新
    async fn on_session_expired(&self);
}

/// 默认空实现（无操作）
pub struct EmptySessionExpiredHandler;

#[async_trait]
impl SessionExpiredHandler for EmptySessionExpiredHandler {
    async fn on_session_expired(&self) {
        // 默认不做任何处理
    }
}

/// 内存会话
///
/// 在进程内存中持有令牌，刷新时调用后端 `/auth/refresh` 接口。
/// 进程退出后会话即消失，没有任何本地持久化。
pub struct MemorySession {
    auth_base_url: String,
    user_id: RwLock<Option<String>>,
    access_token: RwLock<Option<String>>,
    refresh_token: RwLock<Option<String>>,
}

impl MemorySession {
    /// 创建空会话（未登录状态）
    pub fn new(auth_base_url: impl Into<String>) -> Self {
        Self {
            auth_base_url: auth_base_url.into(),
            user_id: RwLock::new(None),
            access_token: RwLock::new(None),
            refresh_token: RwLock::new(None),
        }
    }

    /// 用已知令牌初始化会话（例如从登录响应）
    pub fn authenticated(
        auth_base_url: impl Into<String>,
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            auth_base_url: auth_base_url.into(),
            user_id: RwLock::new(Some(user_id.into())),
            access_token: RwLock::new(Some(access_token.into())),
            refresh_token: RwLock::new(Some(refresh_token.into())),
        }
    }

    /// 登录并在会话中保存令牌
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let data = auth::login_async(&self.auth_base_url, email, password).await?;
        info!("[Session] ✅ 登录成功, userID={}", data.user_id);
        *self.user_id.write().unwrap() = Some(data.user_id);
        *self.access_token.write().unwrap() = Some(data.access_token);
        *self.refresh_token.write().unwrap() = Some(data.refresh_token);
        Ok(())
    }

    /// 清空会话（登出）
    pub fn clear(&self) {
        *self.user_id.write().unwrap() = None;
        *self.access_token.write().unwrap() = None;
        *self.refresh_token.write().unwrap() = None;
    }
}

#[async_trait]
impl SessionProvider for MemorySession {
    fn user_id(&self) -> Option<String> {
        self.user_id.read().unwrap().clone()
    }

    fn access_token(&self) -> Option<String> {
        self.access_token.read().unwrap().clone()
    }

    async fn refresh_access_token(&self) -> Result<String> {
        let refresh_token = self
            .refresh_token
            .read()
            .unwrap()
            .clone()
            .context("没有可用的刷新令牌")?;

        let new_token = match auth::refresh_async(&self.auth_base_url, &refresh_token).await {
            Ok(t) => t,
            Err(e) => {
                warn!("[Session] ⚠️ 刷新令牌失败: {}", e);
                return Err(e);
            }
        };

        *self.access_token.write().unwrap() = Some(new_token.clone());
        info!("[Session] 🔄 访问令牌已刷新");
        Ok(new_token)
    }
}
