//! 多数据源指标合并

use std::sync::Arc;

use super::{MetricsProvider, PartialMetrics};
use crate::error::{Result, ScreenerError};
use crate::models::{Listing, StockMetricsRecord};

/// 按顺序查询各数据源，同一字段以先返回的数据源为准
pub struct MetricsFetcher {
    providers: Vec<Arc<dyn MetricsProvider>>,
}

impl MetricsFetcher {
    pub fn new(providers: Vec<Arc<dyn MetricsProvider>>) -> Self {
        Self { providers }
    }

    /// 获取并合并指标，全部数据源失败时返回最后一个错误
    pub async fn fetch(&self, listing: &Listing) -> Result<StockMetricsRecord> {
        let mut merged: Option<PartialMetrics> = None;
        let mut last_error = None;

        for provider in &self.providers {
            match provider.fetch_metrics(listing).await {
                Ok(partial) => match merged.as_mut() {
                    Some(existing) => existing.fill_missing(partial),
                    None => merged = Some(partial),
                },
                Err(e) => {
                    log::warn!("[{}] 获取 {} 指标失败: {}", provider.name(), listing, e);
                    last_error = Some(e);
                }
            }
        }

        match (merged, last_error) {
            (Some(partial), _) => Ok(partial.into_record(listing)),
            (None, Some(e)) => Err(e),
            (None, None) => Err(ScreenerError::NotConfigured("未配置指标数据源".to_string())),
        }
    }
}
