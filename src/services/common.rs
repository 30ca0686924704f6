//! 公共常量和辅助函数

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Asia::Kolkata;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Result, ScreenerError};

/// 模拟浏览器请求头
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// 获取印度标准时间字符串（ISO 8601 格式，带+05:30时区）
pub fn get_ist_time() -> String {
    Utc::now().with_timezone(&Kolkata).to_rfc3339()
}

/// 构建上游请求使用的 HTTP 客户端
pub fn build_http_client(api: &ApiConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(api.timeout())
        .connect_timeout(api.connect_timeout())
        .cookie_store(true)
        .gzip(true)
        .build()
}

/// 在基础地址后追加一个路径段（自动编码空格、`/` 等字符）
pub fn endpoint(base: &str, segment: &str) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| ScreenerError::NotConfigured(format!("无效的上游地址 {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| ScreenerError::NotConfigured(format!("无效的上游地址 {}", base)))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// 按 HTTP 状态码分类上游错误
pub fn classify_status(status: StatusCode, what: &str) -> Option<ScreenerError> {
    if status.is_success() {
        return None;
    }
    let message = format!("{} 返回 {}", what, status);
    Some(if status == StatusCode::NOT_FOUND {
        ScreenerError::SymbolNotFound(message)
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ScreenerError::UpstreamUnavailable(message)
    } else {
        ScreenerError::UpstreamRejected(message)
    })
}

/// 检查响应状态，非 2xx 转为对应错误
pub fn check_status(response: Response, what: &str) -> Result<Response> {
    match classify_status(response.status(), what) {
        Some(err) => Err(err),
        None => Ok(response),
    }
}

/// 上游请求重试策略
///
/// 仅对可重试错误生效，第 n 次重试前等待 `backoff * n`
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            max_retries: api.max_retries,
            backoff: api.retry_backoff(),
        }
    }

    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    log::warn!("{} 失败，第 {} 次重试: {}", what, attempt, e);
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// 解析数值，兼容数字、数字字符串和 Yahoo 的 `{"raw": ..}` 对象
pub fn json_number(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Object(map) => map.get("raw").and_then(json_number),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
