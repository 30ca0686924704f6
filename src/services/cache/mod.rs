//! 指标缓存模块
//!
//! 以 Yahoo 代码（如 `TCS.NS`）为键缓存指标快照，超过有效期视为未命中。
//! 存储后端可替换：SQLite（默认，重启后保留）或内存。

mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::models::StockMetricsRecord;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

/// 缓存条目
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub record: StockMetricsRecord,
    pub updated_at: DateTime<Utc>,
}

/// 缓存存储后端
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// 同一键写入时整条替换
    async fn save(&self, key: &str, entry: CacheEntry) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// 带有效期的缓存
///
/// 后端出错时按未命中处理，只记录日志
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub async fn get(&self, key: &str) -> Option<StockMetricsRecord> {
        self.get_at(key, Utc::now()).await
    }

    /// 以指定时间判断是否过期；过期条目不删除，等待下次写入覆盖
    pub async fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<StockMetricsRecord> {
        match self.backend.load(key).await {
            Ok(Some(entry)) if now - entry.updated_at < self.ttl => Some(entry.record),
            Ok(Some(_)) => {
                log::debug!("缓存已过期: {}", key);
                None
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("读取缓存 {} 失败: {}", key, e);
                None
            }
        }
    }

    pub async fn put(&self, key: &str, record: &StockMetricsRecord) {
        self.put_at(key, record, Utc::now()).await
    }

    pub async fn put_at(&self, key: &str, record: &StockMetricsRecord, now: DateTime<Utc>) {
        let entry = CacheEntry {
            record: record.clone(),
            updated_at: now,
        };
        if let Err(e) = self.backend.save(key, entry).await {
            log::warn!("写入缓存 {} 失败: {}", key, e);
        }
    }

    pub async fn invalidate(&self, key: &str) {
        if let Err(e) = self.backend.remove(key).await {
            log::warn!("删除缓存 {} 失败: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exchange, Listing};
    use crate::services::testing::FailingCache;
    use chrono::TimeZone;

    fn record(pe: f64) -> StockMetricsRecord {
        let mut record = StockMetricsRecord::fallback(&Listing::new("TCS", Exchange::Nse));
        record.name = "Tata Consultancy Services".to_string();
        record.pe = pe;
        record
    }

    fn store() -> CacheStore {
        CacheStore::new(Arc::new(MemoryCache::new()), Duration::hours(18))
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = store();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        cache.put_at("TCS.NS", &record(18.0), t0).await;

        let hit = cache.get_at("TCS.NS", t0 + Duration::hours(17)).await;
        assert_eq!(hit.map(|r| r.pe), Some(18.0));

        assert!(cache.get_at("TCS.NS", t0 + Duration::hours(19)).await.is_none());
        assert!(cache.get_at("TCS.NS", t0 + Duration::hours(18)).await.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_entry() {
        let cache = store();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        cache.put_at("TCS.NS", &record(18.0), t0).await;
        cache.put_at("TCS.NS", &record(21.0), t0 + Duration::hours(1)).await;

        let hit = cache.get_at("TCS.NS", t0 + Duration::hours(18)).await;
        assert_eq!(hit.map(|r| r.pe), Some(21.0));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = store();
        cache.put("TCS.NS", &record(18.0)).await;
        assert!(cache.get("TCS.NS").await.is_some());
        cache.invalidate("TCS.NS").await;
        assert!(cache.get("TCS.NS").await.is_none());
    }

    /// 后端故障时按未命中处理
    #[tokio::test]
    async fn test_backend_failure_is_miss() {
        let cache = CacheStore::new(Arc::new(FailingCache), Duration::hours(18));
        cache.put("TCS.NS", &record(18.0)).await;
        assert!(cache.get("TCS.NS").await.is_none());
    }
}
