//! Space Probe - 可用空间估算
//!
//! `DirectoryQuotaProbe`: 可用空间 = 配额 - 目录内已用字节；配额为 0 表示不限

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{SpaceProbe, StorageError};

/// 基于目录配额的空间探测
#[derive(Debug, Clone, Copy)]
pub struct DirectoryQuotaProbe {
    quota_bytes: u64,
}

impl DirectoryQuotaProbe {
    pub fn new(quota_bytes: u64) -> Self {
        Self { quota_bytes }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }
}

/// 目录下（含子目录）普通文件的总字节数
pub(crate) async fn directory_usage(dir: &Path) -> Result<u64, StorageError> {
    let mut used = 0u64;
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = match fs::read_dir(&current).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(StorageError::io(&current, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&current, e))?
        {
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| StorageError::io(&entry.path(), e))?;
            if metadata.is_dir() {
                pending.push(entry.path());
            } else if metadata.is_file() {
                used += metadata.len();
            }
        }
    }

    Ok(used)
}

#[async_trait]
impl SpaceProbe for DirectoryQuotaProbe {
    async fn available_bytes(&self, dir: &Path) -> Result<u64, StorageError> {
        if self.quota_bytes == 0 {
            return Ok(u64::MAX);
        }
        let used = directory_usage(dir).await?;
        Ok(self.quota_bytes.saturating_sub(used))
    }
}

/// 固定可用空间，用于测试
#[derive(Debug, Clone, Copy)]
pub struct FixedSpaceProbe(pub u64);

#[async_trait]
impl SpaceProbe for FixedSpaceProbe {
    async fn available_bytes(&self, _dir: &Path) -> Result<u64, StorageError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_quota_minus_usage() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.wav"), vec![0u8; 300]).await.unwrap();
        fs::create_dir(dir.path().join("nested")).await.unwrap();
        fs::write(dir.path().join("nested/b.wav"), vec![0u8; 200]).await.unwrap();

        let probe = DirectoryQuotaProbe::new(1000);
        assert_eq!(probe.available_bytes(dir.path()).await.unwrap(), 500);

        let tight = DirectoryQuotaProbe::new(100);
        assert_eq!(tight.available_bytes(dir.path()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unlimited_and_missing_dir() {
        let dir = tempdir().unwrap();
        let probe = DirectoryQuotaProbe::unlimited();
        assert_eq!(probe.available_bytes(dir.path()).await.unwrap(), u64::MAX);

        let probe = DirectoryQuotaProbe::new(10);
        let missing = dir.path().join("missing");
        assert_eq!(probe.available_bytes(&missing).await.unwrap(), 10);
    }
}
