//! Catalog Refresher - 音色目录后台刷新
//!
//! 定时刷新当前平台的目录桶（仅当已缓存）；失败只记日志

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::voice::Platform;
use crate::infrastructure::memory::{RefreshOutcome, VoiceCatalogCache};

/// 刷新配置
#[derive(Debug, Clone)]
pub struct CatalogRefresherConfig {
    pub interval: Duration,
    pub platform: Platform,
}

impl Default for CatalogRefresherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(12 * 60 * 60), // 12 小时
            platform: Platform::current(),
        }
    }
}

/// 刷新任务句柄
pub struct RefreshHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl RefreshHandle {
    /// 停止定时器；正在进行的拉取会完成但结果被丢弃
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 停止并等待后台任务退出
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "Catalog refresher task failed");
        }
    }
}

/// 刷新 Worker
pub struct CatalogRefresher {
    config: CatalogRefresherConfig,
    cache: Arc<VoiceCatalogCache>,
}

impl CatalogRefresher {
    pub fn new(config: CatalogRefresherConfig, cache: Arc<VoiceCatalogCache>) -> Self {
        Self { config, cache }
    }

    /// 在当前 runtime 上启动
    pub fn spawn(self) -> RefreshHandle {
        let cancel = CancellationToken::new();
        let join = tokio::spawn(self.run(cancel.clone()));
        RefreshHandle { cancel, join }
    }

    /// 启动 Worker
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            platform = %self.config.platform,
            interval_secs = self.config.interval.as_secs(),
            "CatalogRefresher started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 第一次 tick 立即返回，跳过
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self
                .cache
                .refresh_cached(self.config.platform, &cancel)
                .await
            {
                Ok(RefreshOutcome::Refreshed(count)) => tracing::info!(
                    platform = %self.config.platform,
                    voices = count,
                    "Voice catalog refreshed"
                ),
                Ok(RefreshOutcome::NotCached) => tracing::debug!(
                    platform = %self.config.platform,
                    "Voice catalog not cached, refresh skipped"
                ),
                Ok(RefreshOutcome::Discarded) => break,
                Err(e) => tracing::warn!(
                    platform = %self.config.platform,
                    error = %e,
                    "Voice catalog refresh failed"
                ),
            }
        }

        tracing::info!("CatalogRefresher stopped");
    }
}
