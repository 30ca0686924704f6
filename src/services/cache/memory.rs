use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{CacheBackend, CacheEntry};
use crate::error::{Result, ScreenerError};

/// 进程内缓存，重启后清空
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> ScreenerError {
    ScreenerError::CacheBackend("内存缓存锁已损坏".to_string())
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
