//! 应用共享状态
//!
//! 启动时根据配置组装数据源、缓存和选股器，由各 worker 共享

use std::sync::Arc;

use anyhow::Context;

use crate::config::{AppConfig, CacheBackendKind};
use crate::services::cache::{CacheBackend, CacheStore, MemoryCache, SqliteCache};
use crate::services::common::{build_http_client, RetryPolicy};
use crate::services::llm::{ChatCompletionsClient, ChatModel};
use crate::services::screener::{ListingSource, NseListingSource, Screener, UniverseSelector};
use crate::services::stock::{AlphaVantageClient, MetricsFetcher, MetricsProvider, YahooClient};
use crate::services::stock_service::StockService;

#[derive(Clone)]
pub struct AppState {
    pub stocks: Arc<StockService>,
    pub screener: Arc<Screener>,
    /// 未配置大模型 Key 时为 None
    pub llm: Option<Arc<dyn ChatModel>>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = build_http_client(&config.api).context("创建 HTTP 客户端失败")?;
        let retry = RetryPolicy::from_config(&config.api);

        let yahoo = Arc::new(YahooClient::new(client.clone(), &config.providers, retry));
        let mut providers: Vec<Arc<dyn MetricsProvider>> = vec![yahoo.clone()];
        if config.providers.alpha_vantage_key.trim().is_empty() {
            log::info!("未配置 Alpha Vantage Key，仅使用 Yahoo Finance");
        } else {
            providers.push(Arc::new(AlphaVantageClient::new(
                client.clone(),
                &config.providers.alpha_vantage_url,
                &config.providers.alpha_vantage_key,
                retry,
            )));
        }

        let backend: Arc<dyn CacheBackend> = match config.cache.backend {
            CacheBackendKind::Sqlite => Arc::new(SqliteCache::open(&config.cache.db_path)?),
            CacheBackendKind::Memory => Arc::new(MemoryCache::new()),
        };
        let cache = CacheStore::new(backend, config.cache.ttl());

        let stocks = Arc::new(StockService::new(
            MetricsFetcher::new(providers),
            cache,
            yahoo,
        ));

        let live: Option<Arc<dyn ListingSource>> = if config.universe.live_listings {
            Some(Arc::new(NseListingSource::new(
                client,
                &config.universe.nse_listing_url,
                retry,
            )))
        } else {
            None
        };
        let screener = Arc::new(Screener::new(stocks.clone(), UniverseSelector::new(live)));

        let llm = ChatCompletionsClient::from_config(&config.llm, retry)
            .context("创建大模型客户端失败")?
            .map(|c| Arc::new(c) as Arc<dyn ChatModel>);
        if llm.is_none() {
            log::warn!("未配置大模型 API Key，AI 接口将返回 500");
        }

        Ok(Self {
            stocks,
            screener,
            llm,
        })
    }
}
