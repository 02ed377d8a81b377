//! 通用类型定义
//!
//! 包含统一的请求结果结构 `ApiResult` 以及若干反序列化辅助函数。

use serde::{Deserialize, Deserializer};

/// 统一的请求结果结构体（包含 data、error、status）
///
/// HTTP 封装层保证所有请求最终都以该结构返回：
/// 网络错误、反序列化错误和服务器错误都不会以异常形式向上传播，
/// 而是被捕获并填入 `error` 字段。调用方通过检查 `data` / `error`
/// 判断结果，而不是捕获异常。
#[derive(Debug)]
pub struct ApiResult<T> {
    /// 响应数据（失败或响应体为空时为 None）
    pub data: Option<T>,
    /// 人类可读的错误信息（成功时为 None）
    pub error: Option<String>,
    /// HTTP 状态码（未收到响应时为 None）
    pub status: Option<u16>,
}

impl<T> ApiResult<T> {
    /// 构造成功结果
    pub fn ok(data: Option<T>, status: u16) -> Self {
        Self {
            data,
            error: None,
            status: Some(status),
        }
    }

    /// 构造失败结果
    pub fn fail(error: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
            status,
        }
    }

    /// 是否成功（无错误）
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 从非 2xx 响应体中尽力提取人类可读的错误信息
///
/// 优先取 JSON 中的 `message` 字段，其次使用原始响应体文本，
/// 响应体为空时退化为 HTTP 状态码描述。
pub fn extract_error_message(status: u16, body: &[u8]) -> String {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        format!("HTTP 错误 {}", status)
    } else {
        format!("HTTP 错误 {}: {}", status, text)
    }
}

/// 反序列化数组字段，处理 null 值
pub(crate) fn deserialize_vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_message_field() {
        let body = br#"{"message":"Group not found"}"#;
        assert_eq!(extract_error_message(404, body), "Group not found");
    }

    #[test]
    fn extract_falls_back_to_raw_body() {
        let body = b"internal error";
        assert_eq!(extract_error_message(500, body), "HTTP 错误 500: internal error");
    }

    #[test]
    fn extract_falls_back_to_status() {
        assert_eq!(extract_error_message(502, b""), "HTTP 错误 502");
    }
}
