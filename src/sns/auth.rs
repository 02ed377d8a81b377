//! 认证 HTTP 接口
//!
//! 登录和令牌刷新由外部认证服务提供，这里只做 REST 调用。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 登录成功后返回的会话数据
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct RefreshData {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// 登录获取访问令牌和刷新令牌
pub async fn login_async(base_url: &str, email: &str, password: &str) -> Result<LoginData> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/auth/login", base_url);

    info!("[Auth] 🔐 正在登录...");
    debug!("[Auth]   URL: {}", url);
    debug!("[Auth]   邮箱: {}, OperationID: {}", email, operation_id);

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("operationID", &operation_id)
        .json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
        .send()
        .await
        .context("登录请求失败")?;

    let status = response.status();
    let text = response.text().await.context("读取登录响应失败")?;

    if !status.is_success() {
        return Err(anyhow::anyhow!("HTTP 错误 {}: {}", status, text));
    }

    debug!("[Auth] ✅ 登录响应: {}", text);

    let data: LoginData = serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("解析登录响应失败: {}，原始响应: {}", e, text))?;

    Ok(data)
}

/// 用刷新令牌换取新的访问令牌
pub async fn refresh_async(base_url: &str, refresh_token: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/auth/refresh", base_url);

    debug!("[Auth] 🔄 正在刷新访问令牌...");
    debug!("[Auth]   URL: {}, OperationID: {}", url, operation_id);

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("operationID", &operation_id)
        .json(&serde_json::json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .context("刷新令牌请求失败")?;

    let status = response.status();
    let text = response.text().await.context("读取刷新响应失败")?;

    if !status.is_success() {
        return Err(anyhow::anyhow!("HTTP 错误 {}: {}", status, text));
    }

    let data: RefreshData = serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("解析刷新响应失败: {}，原始响应: {}", e, text))?;

    Ok(data.access_token)
}
