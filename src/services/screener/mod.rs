//! 选股器
//!
//! 解析股票池，逐只读取缓存或实时获取指标，保留满足条件的记录

mod companies;
mod filter;
mod universe;

use std::sync::Arc;

use crate::models::{FilterRequest, StockMetricsRecord};
use crate::services::stock_service::StockService;

pub use filter::matches;
pub use universe::{ListingSource, NseListingSource, UniverseSelector};

pub struct Screener {
    stocks: Arc<StockService>,
    universe: UniverseSelector,
}

impl Screener {
    pub fn new(stocks: Arc<StockService>, universe: UniverseSelector) -> Self {
        Self { stocks, universe }
    }

    pub fn universe(&self) -> &UniverseSelector {
        &self.universe
    }

    /// 顺序扫描股票池
    ///
    /// 无法获取数据的股票不参与筛选；排序为稳定排序，市值相同保持股票池顺序
    pub async fn run(&self, request: &FilterRequest) -> Vec<StockMetricsRecord> {
        let spec = request.filter_spec();
        let listings = self.universe.resolve(request.index, request.exchange).await;
        log::info!(
            "开始筛选: {} 只股票, {} 个条件",
            listings.len(),
            spec.criteria().count()
        );

        let mut results = Vec::new();
        let mut skipped = 0usize;
        for listing in &listings {
            let lookup = self.stocks.lookup(listing).await;
            if !lookup.is_available() {
                skipped += 1;
                continue;
            }
            if matches(&lookup.record, &spec) {
                results.push(lookup.record);
            }
        }

        if request.sort_by_market_cap {
            results.sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap));
        }

        log::info!(
            "筛选完成: {} 只符合条件, {} 只无数据",
            results.len(),
            skipped
        );
        results
    }
}
