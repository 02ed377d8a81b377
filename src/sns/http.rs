//! 认证 HTTP 封装层
//!
//! 所有领域 API 都通过这里发请求：自动附加 Bearer 令牌，
//! 收到 401 时通过会话提供者刷新令牌并重放原请求一次，
//! 并把所有结果（包括网络错误和服务器错误）统一为 `ApiResult`。
//!
//! 单次请求的状态流转：
//! `Sent` → `Success` | `AuthExpired`(401) | `OtherError`。
//! `AuthExpired` 进入刷新流程；刷新成功后用新令牌重放原请求一次，
//! 得到 `Success` 或终态的 `OtherError`。`retried` 标志保证最多
//! 重放一次，不会进入无限刷新循环。刷新失败时触发注入的
//! `SessionExpiredHandler` 回调（由宿主决定是否跳转登录页）。

use crate::sns::session::{SessionExpiredHandler, SessionProvider};
use crate::sns::types::{extract_error_message, ApiResult};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 认证 HTTP 客户端
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
    expired_handler: Arc<dyn SessionExpiredHandler>,
}

impl HttpApi {
    /// 创建新的 HTTP 客户端
    pub fn new(
        base_url: String,
        session: Arc<dyn SessionProvider>,
        expired_handler: Arc<dyn SessionExpiredHandler>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            session,
            expired_handler,
        }
    }

    /// GET 请求
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::GET, path, None).await
    }

    /// POST 请求
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> ApiResult<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// PUT 请求
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> ApiResult<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// DELETE 请求
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::DELETE, path, None).await
    }

    /// 通用请求入口
    ///
    /// 所有错误都被捕获并转换为 `ApiResult`，不会向调用方抛异常。
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let operation_id = Uuid::new_v4().to_string();
        let mut token = self.session.access_token();
        let mut retried = false;

        debug!("[Http] 📡 {} {} (operationID={})", method, url, operation_id);

        loop {
            let mut req = self
                .client
                .request(method.clone(), &url)
                .header("Content-Type", "application/json")
                .header("operationID", &operation_id);
            if let Some(t) = &token {
                req = req.bearer_auth(t);
            }
            if let Some(b) = &body {
                req = req.json(b);
            }

            let response = match req.send().await {
                Ok(r) => r,
                Err(e) => {
                    error!("[Http] ❌ {} {} 网络错误: {}", method, url, e);
                    return ApiResult::fail(format!("网络错误: {}", e), None);
                }
            };

            let status = response.status();

            // 401：通过会话提供者刷新令牌，重放原请求一次
            if status == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                warn!("[Http] ⚠️ {} {} 返回 401，尝试刷新令牌", method, url);
                match self.session.refresh_access_token().await {
                    Ok(new_token) => {
                        info!("[Http] 🔄 令牌刷新成功，重放原请求");
                        token = Some(new_token);
                        continue;
                    }
                    Err(e) => {
                        error!("[Http] ❌ 令牌刷新失败，会话已过期: {}", e);
                        self.expired_handler.on_session_expired().await;
                        return ApiResult::fail(
                            format!("会话已过期: {}", e),
                            Some(status.as_u16()),
                        );
                    }
                }
            }

            let body_bytes = match response.bytes().await {
                Ok(b) => b,
                Err(e) => {
                    error!("[Http] ❌ {} {} 读取响应 body 失败: {}", method, url, e);
                    return ApiResult::fail(
                        format!("读取响应失败: {}", e),
                        Some(status.as_u16()),
                    );
                }
            };

            if !status.is_success() {
                let message = extract_error_message(status.as_u16(), &body_bytes);
                error!("[Http] ❌ {} {} 请求失败: {}", method, url, message);
                return ApiResult::fail(message, Some(status.as_u16()));
            }

            debug!("[Http] ✅ {} {} 状态: {}", method, url, status);

            // 部分接口（例如 DELETE）成功时没有响应体
            if body_bytes.iter().all(|b| b.is_ascii_whitespace()) {
                return ApiResult::ok(None, status.as_u16());
            }

            return match serde_json::from_slice::<T>(&body_bytes) {
                Ok(data) => ApiResult::ok(Some(data), status.as_u16()),
                Err(e) => {
                    error!(
                        "[Http] ❌ {} {} 反序列化失败: {}, 原始响应: {}",
                        method,
                        url,
                        e,
                        String::from_utf8_lossy(&body_bytes)
                    );
                    ApiResult::fail(format!("反序列化响应失败: {}", e), Some(status.as_u16()))
                }
            };
        }
    }
}
