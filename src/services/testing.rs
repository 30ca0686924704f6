//! 测试用的数据源替身

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;

use crate::error::{Result, ScreenerError};
use crate::models::{Listing, MetricField, PriceBar};
use crate::services::cache::{CacheBackend, CacheEntry, CacheStore, MemoryCache};
use crate::services::llm::ChatModel;
use crate::services::stock::{ChartProvider, MetricsFetcher, MetricsProvider, PartialMetrics};
use crate::services::stock_service::StockService;

/// 指标数据源替身，记录调用次数
pub struct FakeMetricsProvider {
    name: &'static str,
    /// None 表示对所有代码返回同一结果
    by_symbol: Option<HashMap<String, PartialMetrics>>,
    all: Option<PartialMetrics>,
    calls: AtomicUsize,
}

fn partial(values: &[(MetricField, f64)]) -> PartialMetrics {
    let mut partial = PartialMetrics::default();
    for (field, value) in values {
        partial.set(*field, Some(*value));
    }
    partial
}

impl FakeMetricsProvider {
    pub fn with_values(name: &'static str, values: &[(MetricField, f64)]) -> Self {
        Self {
            name,
            by_symbol: None,
            all: Some(partial(values)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            by_symbol: None,
            all: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// 仅对列出的代码返回数据，其余返回 SymbolNotFound
    pub fn by_symbol(entries: &[(&str, &[(MetricField, f64)])]) -> Self {
        let map = entries
            .iter()
            .map(|(symbol, values)| {
                let mut metrics = partial(values);
                metrics.name = Some(format!("{} Ltd", symbol));
                (symbol.to_string(), metrics)
            })
            .collect();
        Self {
            name: "by_symbol",
            by_symbol: Some(map),
            all: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsProvider for FakeMetricsProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_metrics(&self, listing: &Listing) -> Result<PartialMetrics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(map) = &self.by_symbol {
            return map
                .get(&listing.symbol)
                .cloned()
                .ok_or_else(|| ScreenerError::SymbolNotFound(listing.ticker()));
        }
        self.all
            .clone()
            .ok_or_else(|| ScreenerError::UpstreamUnavailable("connection refused".into()))
    }
}

/// 行情替身：每个代码返回 60 根递增K线，最新价 100
#[derive(Default)]
pub struct FakeChartProvider;

#[async_trait]
impl ChartProvider for FakeChartProvider {
    async fn price_history(&self, ticker: &str, _interval: &str, _period: &str) -> Result<Vec<PriceBar>> {
        if ticker.starts_with("MISSING") {
            return Err(ScreenerError::SymbolNotFound(ticker.to_string()));
        }
        Ok((0..60)
            .map(|i| PriceBar {
                date: format!("2024-{:02}-{:02}", i / 28 + 1, i % 28 + 1),
                close: 100.0 + i as f64,
                volume: 1000 + i as u64,
            })
            .collect())
    }

    async fn latest_price(&self, _ticker: &str) -> Result<Option<f64>> {
        Ok(Some(100.0))
    }
}

/// 大模型替身，记录最后一次提示词
#[derive(Default)]
pub struct FakeChat {
    pub reply: String,
    pub last_prompt: Mutex<Option<String>>,
}

impl FakeChat {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            last_prompt: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        Ok(self.reply.clone())
    }
}

/// 始终出错的缓存后端
pub struct FailingCache;

#[async_trait]
impl CacheBackend for FailingCache {
    async fn load(&self, _key: &str) -> Result<Option<CacheEntry>> {
        Err(ScreenerError::CacheBackend("database is locked".into()))
    }

    async fn save(&self, _key: &str, _entry: CacheEntry) -> Result<()> {
        Err(ScreenerError::CacheBackend("database is locked".into()))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(ScreenerError::CacheBackend("database is locked".into()))
    }
}

/// 使用内存缓存和行情替身的股票服务
pub fn stock_service(provider: FakeMetricsProvider) -> Arc<StockService> {
    let fetcher = MetricsFetcher::new(vec![Arc::new(provider) as Arc<dyn MetricsProvider>]);
    let cache = CacheStore::new(Arc::new(MemoryCache::new()), Duration::hours(18));
    Arc::new(StockService::new(fetcher, cache, Arc::new(FakeChartProvider)))
}
