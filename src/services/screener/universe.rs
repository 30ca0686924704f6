//! 股票池选择
//!
//! 指数范围使用静态成分股列表，不依赖网络；
//! `all` 范围可选择合并 NSE 全部上市股票（抓取失败时沿用上次结果）

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use super::companies::{BSE_100, NIFTY_50, NIFTY_NEXT_50, SENSEX_30};
use crate::error::{Result, ScreenerError};
use crate::models::{Exchange, ExchangeScope, IndexScope, Listing};
use crate::services::common::{check_status, RetryPolicy, ACCEPT_HTML};

/// 上市股票列表数据源
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_symbols(&self) -> Result<Vec<String>>;
}

/// NSE "securities available for trading" 页面
pub struct NseListingSource {
    client: Client,
    url: String,
    retry: RetryPolicy,
}

impl NseListingSource {
    pub fn new(client: Client, url: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            url: url.to_string(),
            retry,
        }
    }

    async fn fetch_page(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", ACCEPT_HTML)
            .send()
            .await?;
        Ok(check_status(response, "NSE 上市列表")?.text().await?)
    }
}

#[async_trait]
impl ListingSource for NseListingSource {
    async fn fetch_symbols(&self) -> Result<Vec<String>> {
        log::info!("抓取 NSE 上市股票列表: {}", self.url);
        let html = self.retry.run("NSE 上市列表", || self.fetch_page()).await?;
        parse_listing_html(&html)
    }
}

/// 解析列表页面：表格每行第二列为代码，首行为表头
fn parse_listing_html(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let tr_selector = Selector::parse("table tr").unwrap();
    let td_selector = Selector::parse("td").unwrap();

    let symbols: Vec<String> = document
        .select(&tr_selector)
        .filter_map(|row| {
            let cell = row.select(&td_selector).nth(1)?;
            let text = cell.text().collect::<String>().trim().to_uppercase();
            (!text.is_empty()).then_some(text)
        })
        .collect();

    if symbols.is_empty() {
        return Err(ScreenerError::UpstreamSchemaMismatch(
            "NSE 上市列表页面中未找到股票代码".to_string(),
        ));
    }
    Ok(symbols)
}

fn listings(symbols: &[&str], exchange: Exchange) -> Vec<Listing> {
    symbols.iter().map(|s| Listing::new(*s, exchange)).collect()
}

/// 按代码去重，保留首次出现的顺序
fn dedup_by_symbol(items: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|l| seen.insert(l.symbol.clone()))
        .collect()
}

pub struct UniverseSelector {
    live: Option<Arc<dyn ListingSource>>,
    /// 上次成功抓取的结果
    last_live: RwLock<Vec<String>>,
}

impl UniverseSelector {
    pub fn new(live: Option<Arc<dyn ListingSource>>) -> Self {
        Self {
            live,
            last_live: RwLock::new(Vec::new()),
        }
    }

    /// 解析股票池；指数范围忽略 `exchange`
    pub async fn resolve(&self, index: IndexScope, exchange: ExchangeScope) -> Vec<Listing> {
        match index {
            IndexScope::Nifty50 => listings(&NIFTY_50, Exchange::Nse),
            IndexScope::NiftyNext50 => listings(&NIFTY_NEXT_50, Exchange::Nse),
            IndexScope::Sensex30 => listings(&SENSEX_30, Exchange::Bse),
            IndexScope::Bse100 => listings(&BSE_100, Exchange::Bse),
            IndexScope::All => {
                let mut all = Vec::new();
                if exchange != ExchangeScope::Bse {
                    all.extend(self.nse_universe().await);
                }
                if exchange != ExchangeScope::Nse {
                    all.extend(listings(&SENSEX_30, Exchange::Bse));
                    all.extend(listings(&BSE_100, Exchange::Bse));
                }
                dedup_by_symbol(all)
            }
        }
    }

    async fn nse_universe(&self) -> Vec<Listing> {
        let mut nse = listings(&NIFTY_50, Exchange::Nse);
        nse.extend(listings(&NIFTY_NEXT_50, Exchange::Nse));
        nse.extend(
            self.live_symbols()
                .await
                .into_iter()
                .filter_map(|s| Listing::parse(&s).ok()),
        );
        nse
    }

    async fn live_symbols(&self) -> Vec<String> {
        let Some(source) = &self.live else {
            return Vec::new();
        };

        match source.fetch_symbols().await {
            Ok(symbols) => {
                if let Ok(mut last) = self.last_live.write() {
                    *last = symbols.clone();
                }
                symbols
            }
            Err(e) => {
                let stale = self.last_live.read().map(|l| l.clone()).unwrap_or_default();
                log::warn!("抓取 NSE 上市列表失败，使用上次结果（{} 只）: {}", stale.len(), e);
                stale
            }
        }
    }
}
