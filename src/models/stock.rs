//! 股票数据模型
//!
//! 定义股票指标记录、交易所、历史行情等数据结构

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScreenerError};

/// 交易所
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Nse,
    Bse,
}

impl Exchange {
    /// Yahoo Finance 代码后缀
    pub fn yahoo_suffix(&self) -> &'static str {
        match self {
            Self::Nse => ".NS",
            Self::Bse => ".BO",
        }
    }

    /// Alpha Vantage 代码后缀
    pub fn alpha_vantage_suffix(&self) -> &'static str {
        match self {
            Self::Nse => ".NSE",
            Self::Bse => ".BSE",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nse => write!(f, "NSE"),
            Self::Bse => write!(f, "BSE"),
        }
    }
}

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9][A-Z0-9&\-]*$").unwrap())
}

/// 某交易所上市的一只股票
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Listing {
    /// 交易所代码（不带后缀），如 TCS
    pub symbol: String,
    pub exchange: Exchange,
}

impl Listing {
    pub fn new(symbol: impl Into<String>, exchange: Exchange) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
        }
    }

    /// 解析用户输入的代码
    ///
    /// 支持 `TCS`、`TCS.NS`、`TCS.BO`，无后缀时默认为 NSE；
    /// 代码只允许大写字母、数字、`&` 和 `-`
    pub fn parse(input: &str) -> Result<Self> {
        let normalized = input.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(ScreenerError::InvalidRequest("Symbol is required".to_string()));
        }

        let (symbol, exchange) = if let Some(s) = normalized.strip_suffix(".NS") {
            (s, Exchange::Nse)
        } else if let Some(s) = normalized.strip_suffix(".BO") {
            (s, Exchange::Bse)
        } else {
            (normalized.as_str(), Exchange::Nse)
        };

        if !symbol_pattern().is_match(symbol) {
            return Err(ScreenerError::InvalidRequest(format!(
                "Invalid symbol: {}",
                input.trim()
            )));
        }

        Ok(Self::new(symbol, exchange))
    }

    /// Yahoo Finance 代码，同时作为缓存键
    pub fn ticker(&self) -> String {
        format!("{}{}", self.symbol, self.exchange.yahoo_suffix())
    }

    pub fn alpha_vantage_symbol(&self) -> String {
        format!("{}{}", self.symbol, self.exchange.alpha_vantage_suffix())
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

/// 可筛选的数值指标
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricField {
    Price,
    Pe,
    Pb,
    BookValue,
    Eps,
    DividendYield,
    Roe,
    Cagr5Y,
    DebtToEquity,
    MarketCap,
    Beta,
    AvgVolume,
    CashPerShare,
    PriceToCashFlow,
    PriceToFreeCashFlow,
}

impl MetricField {
    pub const ALL: [MetricField; 15] = [
        Self::Price,
        Self::Pe,
        Self::Pb,
        Self::BookValue,
        Self::Eps,
        Self::DividendYield,
        Self::Roe,
        Self::Cagr5Y,
        Self::DebtToEquity,
        Self::MarketCap,
        Self::Beta,
        Self::AvgVolume,
        Self::CashPerShare,
        Self::PriceToCashFlow,
        Self::PriceToFreeCashFlow,
    ];

    /// JSON 字段名
    pub fn key(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Pe => "pe",
            Self::Pb => "pb",
            Self::BookValue => "bookValue",
            Self::Eps => "eps",
            Self::DividendYield => "dividendYield",
            Self::Roe => "roe",
            Self::Cagr5Y => "cagr5Y",
            Self::DebtToEquity => "debtToEquity",
            Self::MarketCap => "marketCap",
            Self::Beta => "beta",
            Self::AvgVolume => "avgVolume",
            Self::CashPerShare => "cashPerShare",
            Self::PriceToCashFlow => "priceToCashFlow",
            Self::PriceToFreeCashFlow => "priceToFreeCashFlow",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// 越小越好的指标，筛选时使用 `<=`
    pub fn is_lower_bound(&self) -> bool {
        matches!(
            self,
            Self::Pe
                | Self::Pb
                | Self::DebtToEquity
                | Self::Beta
                | Self::PriceToCashFlow
                | Self::PriceToFreeCashFlow
        )
    }
}

fn unknown_sector() -> String {
    "Unknown".to_string()
}

/// 单只股票的指标快照
///
/// 数值字段缺失时为 0，与真实的 0 无法区分，需结合 `DataStatus` 判断
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMetricsRecord {
    pub symbol: String,
    pub name: String,
    pub exchange: Exchange,
    #[serde(default = "unknown_sector")]
    pub sector: String,
    pub price: f64,
    pub pe: f64,
    pub pb: f64,
    pub book_value: f64,
    pub eps: f64,
    /// 股息率（%）
    pub dividend_yield: f64,
    /// 净资产收益率（%）
    pub roe: f64,
    /// 五年盈利增速（%）
    #[serde(rename = "cagr5Y")]
    pub cagr_5y: f64,
    pub debt_to_equity: f64,
    /// 市值（亿卢比 crores）
    pub market_cap: f64,
    pub beta: f64,
    pub avg_volume: f64,
    pub cash_per_share: f64,
    pub price_to_cash_flow: f64,
    pub price_to_free_cash_flow: f64,
}

impl StockMetricsRecord {
    /// 获取失败时的占位记录，所有数值为 0
    pub fn fallback(listing: &Listing) -> Self {
        Self {
            symbol: listing.symbol.clone(),
            name: String::new(),
            exchange: listing.exchange,
            sector: unknown_sector(),
            price: 0.0,
            pe: 0.0,
            pb: 0.0,
            book_value: 0.0,
            eps: 0.0,
            dividend_yield: 0.0,
            roe: 0.0,
            cagr_5y: 0.0,
            debt_to_equity: 0.0,
            market_cap: 0.0,
            beta: 0.0,
            avg_volume: 0.0,
            cash_per_share: 0.0,
            price_to_cash_flow: 0.0,
            price_to_free_cash_flow: 0.0,
        }
    }

    pub fn metric(&self, field: MetricField) -> f64 {
        match field {
            MetricField::Price => self.price,
            MetricField::Pe => self.pe,
            MetricField::Pb => self.pb,
            MetricField::BookValue => self.book_value,
            MetricField::Eps => self.eps,
            MetricField::DividendYield => self.dividend_yield,
            MetricField::Roe => self.roe,
            MetricField::Cagr5Y => self.cagr_5y,
            MetricField::DebtToEquity => self.debt_to_equity,
            MetricField::MarketCap => self.market_cap,
            MetricField::Beta => self.beta,
            MetricField::AvgVolume => self.avg_volume,
            MetricField::CashPerShare => self.cash_per_share,
            MetricField::PriceToCashFlow => self.price_to_cash_flow,
            MetricField::PriceToFreeCashFlow => self.price_to_free_cash_flow,
        }
    }

    pub fn set_metric(&mut self, field: MetricField, value: f64) {
        let slot = match field {
            MetricField::Price => &mut self.price,
            MetricField::Pe => &mut self.pe,
            MetricField::Pb => &mut self.pb,
            MetricField::BookValue => &mut self.book_value,
            MetricField::Eps => &mut self.eps,
            MetricField::DividendYield => &mut self.dividend_yield,
            MetricField::Roe => &mut self.roe,
            MetricField::Cagr5Y => &mut self.cagr_5y,
            MetricField::DebtToEquity => &mut self.debt_to_equity,
            MetricField::MarketCap => &mut self.market_cap,
            MetricField::Beta => &mut self.beta,
            MetricField::AvgVolume => &mut self.avg_volume,
            MetricField::CashPerShare => &mut self.cash_per_share,
            MetricField::PriceToCashFlow => &mut self.price_to_cash_flow,
            MetricField::PriceToFreeCashFlow => &mut self.price_to_free_cash_flow,
        };
        *slot = value;
    }
}

/// 指标来源状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataStatus {
    /// 刚从上游获取
    Live,
    /// 来自未过期缓存
    Cached,
    /// 上游失败，记录为 0 占位
    Unavailable,
}

/// 单只股票查询结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsLookup {
    #[serde(flatten)]
    pub record: StockMetricsRecord,
    pub data_status: DataStatus,
}

impl MetricsLookup {
    pub fn is_available(&self) -> bool {
        self.data_status != DataStatus::Unavailable
    }
}

/// POST /screener/get-stock-data 请求体
///
/// 指标为时点数据，请求中的 `period` 字段忽略
#[derive(Debug, Deserialize)]
pub struct StockDataRequest {
    #[serde(default)]
    pub symbol: Option<String>,
}

/// 历史行情区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    FiveDays,
    OneWeek,
    OneMonth,
    SixMonths,
    OneYear,
    FiveYears,
}

impl HistoryRange {
    /// 未知取值按 1m 处理
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "5d" => Self::FiveDays,
            "1w" => Self::OneWeek,
            "6m" => Self::SixMonths,
            "1y" => Self::OneYear,
            "5y" => Self::FiveYears,
            _ => Self::OneMonth,
        }
    }

    /// (interval, range) 上游参数
    pub fn interval_and_period(&self) -> (&'static str, &'static str) {
        match self {
            Self::FiveDays => ("1d", "5d"),
            Self::OneWeek => ("1d", "1wk"),
            Self::OneMonth => ("1d", "1mo"),
            Self::SixMonths => ("1d", "6mo"),
            Self::OneYear => ("1d", "1y"),
            Self::FiveYears => ("1wk", "5y"),
        }
    }
}

/// 历史查询参数
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub range: Option<String>,
}

/// 单根K线（仅保留收盘价和成交量）
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    /// 日期（YYYY-MM-DD，交易所当地时间）
    pub date: String,
    pub close: f64,
    pub volume: u64,
}

/// 历史行情图表数据
#[derive(Debug, Clone, Serialize)]
pub struct HistoricalSeries {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
    pub volumes: Vec<u64>,
    pub ma20: Vec<Option<f64>>,
    pub ma50: Vec<Option<f64>>,
}

impl HistoricalSeries {
    pub fn from_bars(bars: &[PriceBar]) -> Self {
        let prices: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Self {
            dates: bars.iter().map(|b| b.date.clone()).collect(),
            volumes: bars.iter().map(|b| b.volume).collect(),
            ma20: moving_average(&prices, 20),
            ma50: moving_average(&prices, 50),
            prices,
        }
    }
}

/// 简单移动平均，窗口未满时为 None
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        if window > 0 && i + 1 >= window {
            result.push(Some(sum / window as f64));
        } else {
            result.push(None);
        }
    }
    result
}
