//! 股票数据服务模块
//!
//! 提供股票指标和行情数据，支持多种数据源
//!
//! ## 数据来源
//! - Yahoo Finance：指标（quoteSummary）和历史行情（chart）
//! - Alpha Vantage：补充指标（OVERVIEW / EARNINGS），需配置 Key

mod alpha_vantage;
mod fetcher;
mod yahoo;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Listing, MetricField, PriceBar, StockMetricsRecord};

pub use alpha_vantage::AlphaVantageClient;
pub use fetcher::MetricsFetcher;
pub use yahoo::YahooClient;

/// 1 crore = 1e7 卢比
pub const CRORE: f64 = 1e7;

/// 小数比例转百分比（0.12 -> 12.0）
pub fn as_percent(fraction: Option<f64>) -> Option<f64> {
    fraction.map(|v| v * 100.0)
}

/// 卢比转亿卢比（crores）
pub fn to_crores(rupees: Option<f64>) -> Option<f64> {
    rupees.map(|v| v / CRORE)
}

/// 市值与现金流之比，现金流非正时不计算
pub fn cash_flow_multiple(market_cap: Option<f64>, cash_flow: Option<f64>) -> Option<f64> {
    match (market_cap, cash_flow) {
        (Some(cap), Some(flow)) if flow > 0.0 => Some(cap / flow),
        _ => None,
    }
}

/// 单个数据源返回的部分指标
///
/// 数值已换算为统一单位（百分比、亿卢比），缺失的字段不出现
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialMetrics {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub values: BTreeMap<MetricField, f64>,
}

impl PartialMetrics {
    /// 仅记录有限数值
    pub fn set(&mut self, field: MetricField, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.values.insert(field, v);
        }
    }

    pub fn get(&self, field: MetricField) -> Option<f64> {
        self.values.get(&field).copied()
    }

    /// 用另一个数据源补齐缺失字段，已有值保持不变
    pub fn fill_missing(&mut self, other: PartialMetrics) {
        if self.name.is_none() {
            self.name = other.name;
        }
        if self.sector.is_none() {
            self.sector = other.sector;
        }
        for (field, value) in other.values {
            self.values.entry(field).or_insert(value);
        }
    }

    /// 转为完整记录，缺失字段为 0
    pub fn into_record(self, listing: &Listing) -> StockMetricsRecord {
        let mut record = StockMetricsRecord::fallback(listing);
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(sector) = self.sector {
            record.sector = sector;
        }
        for (field, value) in self.values {
            record.set_metric(field, value);
        }
        record
    }
}

/// 指标数据源
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_metrics(&self, listing: &Listing) -> Result<PartialMetrics>;
}

/// 行情数据源
#[async_trait]
pub trait ChartProvider: Send + Sync {
    /// 历史K线，`interval`/`period` 为 Yahoo 取值（如 1d / 1mo）
    async fn price_history(&self, ticker: &str, interval: &str, period: &str)
        -> Result<Vec<PriceBar>>;

    /// 最新价格，上游未提供时为 None
    async fn latest_price(&self, ticker: &str) -> Result<Option<f64>>;
}
