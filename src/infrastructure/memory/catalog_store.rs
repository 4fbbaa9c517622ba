//! In-Memory Catalog Store
//!
//! 不落盘的快照存储，用于测试和禁用持久化的场景

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::ports::{CatalogSnapshot, CatalogStorePort, PersistenceError};

#[derive(Default)]
pub struct InMemoryCatalogStore {
    snapshot: Mutex<Option<CatalogSnapshot>>,
    saves: AtomicU64,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            saves: AtomicU64::new(0),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 累计写入次数
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CatalogStorePort for InMemoryCatalogStore {
    async fn load(&self) -> Result<Option<CatalogSnapshot>, PersistenceError> {
        Ok(self.snapshot.lock().clone())
    }

    async fn save(&self, snapshot: &CatalogSnapshot) -> Result<(), PersistenceError> {
        *self.snapshot.lock() = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        *self.snapshot.lock() = None;
        Ok(())
    }
}

/// 每次写入都失败的存储，用来验证写入错误不会影响缓存
#[cfg(test)]
#[derive(Default)]
pub struct FailingCatalogStore {
    attempts: AtomicU64,
}

#[cfg(test)]
impl FailingCatalogStore {
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[async_trait]
impl CatalogStorePort for FailingCatalogStore {
    async fn load(&self) -> Result<Option<CatalogSnapshot>, PersistenceError> {
        Ok(None)
    }

    async fn save(&self, _snapshot: &CatalogSnapshot) -> Result<(), PersistenceError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(PersistenceError::DatabaseError("disk unavailable".to_string()))
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}
