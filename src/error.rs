//! 错误类型
//!
//! 上游数据源、缓存和请求校验的统一错误分类

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;

#[derive(Debug, Error)]
pub enum ScreenerError {
    /// 网络错误、超时、上游 5xx/429
    #[error("上游服务不可用: {0}")]
    UpstreamUnavailable(String),
    /// 上游拒绝请求（鉴权失败、限额用尽等 4xx）
    #[error("上游拒绝请求: {0}")]
    UpstreamRejected(String),
    /// 上游返回的数据结构与预期不符
    #[error("上游数据格式不匹配: {0}")]
    UpstreamSchemaMismatch(String),
    /// 上游明确表示代码不存在
    #[error("未找到股票代码: {0}")]
    SymbolNotFound(String),
    /// 缓存存储不可用
    #[error("缓存存储错误: {0}")]
    CacheBackend(String),
    /// 请求参数缺失或非法
    #[error("{0}")]
    InvalidRequest(String),
    /// 缺少必要的配置（如 API Key）
    #[error("{0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, ScreenerError>;

impl ScreenerError {
    /// 是否值得重试（仅网络类故障）
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }
}

impl From<reqwest::Error> for ScreenerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::UpstreamSchemaMismatch(e.to_string())
        } else {
            Self::UpstreamUnavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ScreenerError {
    fn from(e: serde_json::Error) -> Self {
        Self::UpstreamSchemaMismatch(e.to_string())
    }
}

impl From<rusqlite::Error> for ScreenerError {
    fn from(e: rusqlite::Error) -> Self {
        Self::CacheBackend(e.to_string())
    }
}

impl ResponseError for ScreenerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::SymbolNotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable(_)
            | Self::UpstreamRejected(_)
            | Self::UpstreamSchemaMismatch(_) => StatusCode::BAD_GATEWAY,
            Self::CacheBackend(_) | Self::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}
