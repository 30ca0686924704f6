//! AI 分析数据模型

use serde::{Deserialize, Serialize};

/// POST /ai/query 请求体
#[derive(Debug, Deserialize)]
pub struct AiQueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AiQueryResponse {
    pub answer: String,
}

fn default_period() -> String {
    "1y".to_string()
}

/// 形态分析请求体
#[derive(Debug, Deserialize)]
pub struct PatternRequest {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default = "default_period")]
    pub period: String,
    /// 仅 analyze-chart 使用
    #[serde(default)]
    pub query: Option<String>,
}

/// 从模型回复中解析出的技术形态
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectedPattern {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implications: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrendSummaryResponse {
    pub success: bool,
    pub trend_summary: String,
}

#[derive(Debug, Serialize)]
pub struct PatternsResponse {
    pub success: bool,
    pub patterns: Vec<DetectedPattern>,
}

#[derive(Debug, Serialize)]
pub struct ChartAnalysisResponse {
    pub success: bool,
    pub analysis: String,
}
