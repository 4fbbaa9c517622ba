//! Sled-based Catalog Snapshot Store

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use sled::Db;

use crate::application::ports::{CatalogSnapshot, CatalogStorePort, PersistenceError};

const SNAPSHOT_KEY: &str = "voice_catalog:snapshot";

/// Sled 快照存储
///
/// 单个 key 存放 bincode 编码的整份快照，后写覆盖先写
pub struct SledCatalogStore {
    db: Db,
}

impl SledCatalogStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let db = sled::open(path.as_ref())
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))?;

        tracing::info!(
            db_path = %path.as_ref().display(),
            "SledCatalogStore initialized"
        );

        Ok(Self { db })
    }

    /// 临时数据库（进程结束即删除）
    pub fn temporary() -> Result<Self, PersistenceError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 刷新数据库
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        self.db
            .flush_async()
            .await
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStorePort for SledCatalogStore {
    async fn load(&self) -> Result<Option<CatalogSnapshot>, PersistenceError> {
        let Some(bytes) = self
            .db
            .get(SNAPSHOT_KEY)
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))?
        else {
            return Ok(None);
        };

        let snapshot: CatalogSnapshot =
            bincode::deserialize(&bytes).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;

        tracing::debug!(
            buckets = snapshot.buckets.len(),
            exported_at = %snapshot.exported_at,
            "Catalog snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &CatalogSnapshot) -> Result<(), PersistenceError> {
        let bytes = bincode::serialize(snapshot)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;

        self.db
            .insert(SNAPSHOT_KEY, bytes)
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))?;
        self.flush().await
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        self.db
            .remove(SNAPSHOT_KEY)
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))?;
        self.flush().await
    }
}
