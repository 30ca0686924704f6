//! SQLite 缓存后端
//!
//! 每个代码一行，记录以 JSON 存储，`updated_at` 为 RFC 3339 时间

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::{CacheBackend, CacheEntry};
use crate::error::{Result, ScreenerError};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS stock_cache (
    symbol TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

#[derive(Clone)]
pub struct SqliteCache {
    /// rusqlite::Connection 不是 Sync，需放在 Mutex 中
    db: Arc<Mutex<Connection>>,
}

impl SqliteCache {
    /// 打开（或创建）数据库文件
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("创建缓存目录 {} 失败", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("打开缓存数据库 {} 失败", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .context("设置数据库参数失败")?;

        log::info!("缓存数据库: {}", path.display());
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(CREATE_TABLE_SQL).context("创建缓存表失败")?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// 在阻塞线程池中执行数据库操作，避免磁盘 IO 占用 worker 线程
    async fn with_conn<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.blocking_lock();
            operation(&conn)
        })
        .await
        .map_err(|e| ScreenerError::CacheBackend(format!("缓存任务异常退出: {}", e)))?
    }
}

#[async_trait]
impl CacheBackend for SqliteCache {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let owned_key = key.to_string();
        let row: Option<(String, String)> = self
            .with_conn(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT data, updated_at FROM stock_cache WHERE symbol = ?1",
                        params![owned_key],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?)
            })
            .await?;

        let Some((data, updated_at)) = row else {
            return Ok(None);
        };

        let record = serde_json::from_str(&data)
            .map_err(|e| ScreenerError::CacheBackend(format!("缓存记录 {} 损坏: {}", key, e)))?;
        let updated_at = DateTime::parse_from_rfc3339(&updated_at)
            .map_err(|e| ScreenerError::CacheBackend(format!("缓存时间 {} 损坏: {}", key, e)))?
            .with_timezone(&Utc);

        Ok(Some(CacheEntry { record, updated_at }))
    }

    async fn save(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let data = serde_json::to_string(&entry.record)
            .map_err(|e| ScreenerError::CacheBackend(e.to_string()))?;
        let owned_key = key.to_string();
        let updated_at = entry.updated_at.to_rfc3339();

        self.with_conn(move |conn| {
            conn.execute(
                r#"
                INSERT INTO stock_cache (symbol, data, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(symbol) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
                "#,
                params![owned_key, data, updated_at],
            )?;
            Ok(())
        })
        .await?;

        log::debug!("已缓存 {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let owned_key = key.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM stock_cache WHERE symbol = ?1", params![owned_key])?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exchange, Listing, StockMetricsRecord};
    use chrono::TimeZone;

    fn entry(roe: f64) -> CacheEntry {
        let mut record = StockMetricsRecord::fallback(&Listing::new("INFY", Exchange::Nse));
        record.name = "Infosys".to_string();
        record.sector = "Technology".to_string();
        record.roe = roe;
        CacheEntry {
            record,
            updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 4, 30, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let cache = SqliteCache::open_in_memory().unwrap();
        assert!(cache.load("INFY.NS").await.unwrap().is_none());

        cache.save("INFY.NS", entry(31.5)).await.unwrap();
        assert_eq!(cache.load("INFY.NS").await.unwrap(), Some(entry(31.5)));

        cache.save("INFY.NS", entry(29.0)).await.unwrap();
        assert_eq!(cache.load("INFY.NS").await.unwrap().unwrap().record.roe, 29.0);

        cache.remove("INFY.NS").await.unwrap();
        assert!(cache.load("INFY.NS").await.unwrap().is_none());
    }

    /// 重新打开数据库后缓存仍在
    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stock_cache.db");

        {
            let cache = SqliteCache::open(&path).unwrap();
            cache.save("INFY.NS", entry(31.5)).await.unwrap();
        }

        let reopened = SqliteCache::open(&path).unwrap();
        assert_eq!(reopened.load("INFY.NS").await.unwrap(), Some(entry(31.5)));
    }

    /// 多线程运行时下并发读写互不干扰
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_access() {
        let cache = SqliteCache::open_in_memory().unwrap();
        let mut tasks = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                let key = format!("SYM{}.NS", i);
                cache.save(&key, entry(i as f64)).await.unwrap();
                cache.load(&key).await.unwrap().unwrap().record.roe
            }));
        }
        for (i, task) in tasks.into_iter().enumerate() {
            assert_eq!(task.await.unwrap(), i as f64);
        }
    }

    #[tokio::test]
    async fn test_corrupt_row_is_error() {
        let cache = SqliteCache::open_in_memory().unwrap();
        {
            let db = cache.db.lock().await;
            db.execute(
                "INSERT INTO stock_cache (symbol, data, updated_at) VALUES ('BAD.NS', 'not json', 'x')",
                [],
            )
            .unwrap();
        }
        assert!(matches!(
            cache.load("BAD.NS").await,
            Err(ScreenerError::CacheBackend(_))
        ));
    }
}
