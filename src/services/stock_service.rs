//! 股票数据服务
//!
//! 指标查询走“缓存优先，未命中再获取”的流程：
//! - 缓存未过期：直接返回（cached）
//! - 获取成功：写回缓存（live）
//! - 获取失败：返回全 0 占位记录（unavailable），占位记录不写入缓存
//! - 上游确认代码不存在：同时删除该代码的过期缓存

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Result, ScreenerError};
use crate::models::{
    DataStatus, HistoricalSeries, HistoryRange, Listing, MetricsLookup, PriceBar,
    StockMetricsRecord,
};
use crate::services::cache::CacheStore;
use crate::services::stock::{ChartProvider, MetricsFetcher};

/// 首页展示的市场指数（名称，Yahoo 代码）
pub const MARKET_INDICES: [(&str, &str); 4] = [
    ("NIFTY 50", "^NSEI"),
    ("SENSEX", "^BSESN"),
    ("NIFTY BANK", "^NSEBANK"),
    ("NIFTY IT", "^CNXIT"),
];

/// 指数报价
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexQuote {
    pub symbol: String,
    pub price: Option<f64>,
}

pub struct StockService {
    fetcher: MetricsFetcher,
    cache: CacheStore,
    charts: Arc<dyn ChartProvider>,
}

impl StockService {
    pub fn new(fetcher: MetricsFetcher, cache: CacheStore, charts: Arc<dyn ChartProvider>) -> Self {
        Self {
            fetcher,
            cache,
            charts,
        }
    }

    /// 查询单只股票指标，不会返回错误
    pub async fn lookup(&self, listing: &Listing) -> MetricsLookup {
        let key = listing.ticker();

        if let Some(record) = self.cache.get(&key).await {
            log::debug!("缓存命中: {}", key);
            return MetricsLookup {
                record,
                data_status: DataStatus::Cached,
            };
        }

        match self.fetcher.fetch(listing).await {
            Ok(record) => {
                self.cache.put(&key, &record).await;
                MetricsLookup {
                    record,
                    data_status: DataStatus::Live,
                }
            }
            Err(e) => {
                log::error!("获取 {} 指标失败: {}", key, e);
                if matches!(e, ScreenerError::SymbolNotFound(_)) {
                    self.cache.invalidate(&key).await;
                }
                MetricsLookup {
                    record: StockMetricsRecord::fallback(listing),
                    data_status: DataStatus::Unavailable,
                }
            }
        }
    }

    /// 历史收盘价、成交量及 20/50 日均线
    pub async fn history(&self, listing: &Listing, range: HistoryRange) -> Result<HistoricalSeries> {
        let bars = self.recent_bars(listing, range).await?;
        Ok(HistoricalSeries::from_bars(&bars))
    }

    pub async fn recent_bars(&self, listing: &Listing, range: HistoryRange) -> Result<Vec<PriceBar>> {
        let (interval, period) = range.interval_and_period();
        self.charts
            .price_history(&listing.ticker(), interval, period)
            .await
    }

    /// 主要指数最新点位，单个指数失败时价格为 null
    pub async fn index_quotes(&self) -> BTreeMap<String, IndexQuote> {
        let mut quotes = BTreeMap::new();
        for (name, symbol) in MARKET_INDICES {
            let price = match self.charts.latest_price(symbol).await {
                Ok(price) => price,
                Err(e) => {
                    log::warn!("获取指数 {} 失败: {}", name, e);
                    None
                }
            };
            quotes.insert(
                name.to_string(),
                IndexQuote {
                    symbol: symbol.to_string(),
                    price,
                },
            );
        }
        quotes
    }
}
