//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，密钥可由环境变量覆盖

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API Key（为空则不启用认证）
    #[serde(default)]
    pub api_key: String,
    /// 上游请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 上游请求失败后的最大重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 重试间隔基数（毫秒），第 n 次重试等待 n 倍
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 缓存后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Sqlite,
    Memory,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackendKind,
    /// SQLite 文件路径
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// 缓存有效期（小时）
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

/// 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Alpha Vantage Key（为空则不启用）
    #[serde(default)]
    pub alpha_vantage_key: String,
    #[serde(default = "default_alpha_vantage_url")]
    pub alpha_vantage_url: String,
    /// Yahoo quoteSummary 接口
    #[serde(default = "default_yahoo_url")]
    pub yahoo_base_url: String,
    /// Yahoo chart 接口
    #[serde(default = "default_yahoo_chart_url")]
    pub yahoo_chart_url: String,
    /// 下发 Yahoo Cookie 的地址
    #[serde(default = "default_yahoo_cookie_url")]
    pub yahoo_cookie_url: String,
    /// 获取 quoteSummary crumb 的地址
    #[serde(default = "default_yahoo_crumb_url")]
    pub yahoo_crumb_url: String,
}

/// 大模型配置（OpenAI 兼容的 chat completions 接口）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_url")]
    pub api_url: String,
    /// API Key（为空则 AI 接口返回 500）
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// 股票池配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// "all" 范围是否抓取 NSE 全部上市股票
    #[serde(default)]
    pub live_listings: bool,
    #[serde(default = "default_nse_listing_url")]
    pub nse_listing_url: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }
fn default_timeout() -> u64 { 15 }
fn default_connect_timeout() -> u64 { 5 }
fn default_max_retries() -> u32 { 2 }
fn default_retry_backoff_ms() -> u64 { 500 }
fn default_log_level() -> String { "info".to_string() }
fn default_cache_backend() -> CacheBackendKind { CacheBackendKind::Sqlite }
fn default_db_path() -> PathBuf { PathBuf::from("data/stock_cache.db") }
fn default_ttl_hours() -> u64 { 18 }
fn default_alpha_vantage_url() -> String { "https://www.alphavantage.co/query".to_string() }
fn default_yahoo_url() -> String { "https://query2.finance.yahoo.com/v10/finance/quoteSummary".to_string() }
fn default_yahoo_chart_url() -> String { "https://query1.finance.yahoo.com/v8/finance/chart".to_string() }
fn default_yahoo_cookie_url() -> String { "https://fc.yahoo.com".to_string() }
fn default_yahoo_crumb_url() -> String { "https://query2.finance.yahoo.com/v1/test/getcrumb".to_string() }
fn default_llm_url() -> String { "https://api.groq.com/openai/v1/chat/completions".to_string() }
fn default_llm_model() -> String { "llama-3.3-70b-versatile".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_llm_timeout() -> u64 { 60 }
fn default_nse_listing_url() -> String {
    "https://www.nseindia.com/market-data/securities-available-for-trading".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            db_path: default_db_path(),
            ttl_hours: default_ttl_hours(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            alpha_vantage_key: String::new(),
            alpha_vantage_url: default_alpha_vantage_url(),
            yahoo_base_url: default_yahoo_url(),
            yahoo_chart_url: default_yahoo_chart_url(),
            yahoo_cookie_url: default_yahoo_cookie_url(),
            yahoo_crumb_url: default_yahoo_crumb_url(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_llm_url(),
            api_key: String::new(),
            model: default_llm_model(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            live_listings: false,
            nse_listing_url: default_nse_listing_url(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours as i64)
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值；随后应用环境变量
    pub fn load() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        let mut config = None;
        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(c) => {
                        log::info!("从 {} 加载配置成功", path);
                        config = Some(c);
                        break;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        let mut config = config.unwrap_or_else(|| {
            log::info!("使用默认配置");
            Self::default()
        });
        config.apply_env(|key| env::var(key).ok());
        config
    }

    /// 用环境变量覆盖密钥类配置
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("API_KEY") {
            self.api.api_key = v;
        }
        if let Some(v) = non_empty("ALPHA_VANTAGE_API_KEY") {
            self.providers.alpha_vantage_key = v;
        }
        if let Some(v) = non_empty("LLM_API_KEY").or_else(|| non_empty("GROQ_API_KEY")) {
            self.llm.api_key = v;
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"server": {"port": 9000}, "cache": {"backend": "memory"}}"#)
                .unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.cache.backend, CacheBackendKind::Memory);
        assert_eq!(config.cache.ttl_hours, 18);
        assert_eq!(config.api.max_retries, 2);
        assert!(config.providers.alpha_vantage_key.is_empty());
        assert_eq!(config.providers.yahoo_cookie_url, "https://fc.yahoo.com");
        assert!(config.providers.yahoo_crumb_url.ends_with("/v1/test/getcrumb"));
    }

    #[test]
    fn test_env_overrides_secrets() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "ALPHA_VANTAGE_API_KEY" => Some("av-key".to_string()),
            "LLM_API_KEY" => Some("  ".to_string()),
            "GROQ_API_KEY" => Some("groq-key".to_string()),
            _ => None,
        });
        assert_eq!(config.providers.alpha_vantage_key, "av-key");
        assert_eq!(config.llm.api_key, "groq-key");
        assert!(config.api.api_key.is_empty());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api": {"timeout_secs": 3}, "universe": {"live_listings": true}}"#)
            .unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.api.timeout(), Duration::from_secs(3));
        assert!(config.universe.live_listings);
    }
}
