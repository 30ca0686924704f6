//! 通用 API 响应模型
//!
//! 错误响应格式

use serde::{Deserialize, Serialize};

/// 错误响应 `{"error": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
