//! Catalog Persister - 后台快照写入
//!
//! 目录缓存每次变更都把快照投递到队列，由后台任务写入存储；
//! 变更方从不等待写入完成

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::application::ports::{CatalogSnapshot, CatalogStorePort, PersistenceError};

enum PersistCommand {
    Save(CatalogSnapshot),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// 持久化队列的发送端
#[derive(Clone)]
pub struct PersistHandle {
    sender: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistHandle {
    /// 投递快照（fire-and-forget）
    pub fn enqueue(&self, snapshot: CatalogSnapshot) {
        if self.sender.send(PersistCommand::Save(snapshot)).is_err() {
            tracing::warn!("Catalog persister is closed, snapshot dropped");
        }
    }

    /// 等待此前投递的所有快照写完
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PersistCommand::Flush(tx))
            .map_err(|_| PersistenceError::Closed)?;
        rx.await.map_err(|_| PersistenceError::Closed)
    }

    /// 写完剩余快照后停止后台任务
    pub async fn shutdown(&self) -> Result<(), PersistenceError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PersistCommand::Shutdown(tx))
            .map_err(|_| PersistenceError::Closed)?;
        rx.await.map_err(|_| PersistenceError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// 持久化 Worker
pub struct CatalogPersister {
    receiver: mpsc::UnboundedReceiver<PersistCommand>,
    store: Arc<dyn CatalogStorePort>,
}

impl CatalogPersister {
    pub fn new(store: Arc<dyn CatalogStorePort>) -> (Self, PersistHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { receiver, store }, PersistHandle { sender })
    }

    /// 创建并在当前 runtime 上启动
    pub fn spawn(store: Arc<dyn CatalogStorePort>) -> (PersistHandle, JoinHandle<()>) {
        let (persister, handle) = Self::new(store);
        let join = tokio::spawn(persister.run());
        (handle, join)
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!("CatalogPersister started");

        let mut pending: Option<PersistCommand> = None;

        loop {
            let command = match pending.take() {
                Some(command) => command,
                None => match self.receiver.recv().await {
                    Some(command) => command,
                    None => break,
                },
            };

            match command {
                PersistCommand::Save(mut snapshot) => {
                    // 合并连续的快照，只写最后一份
                    while let Ok(next) = self.receiver.try_recv() {
                        match next {
                            PersistCommand::Save(newer) => snapshot = newer,
                            other => {
                                pending = Some(other);
                                break;
                            }
                        }
                    }
                    self.write(&snapshot).await;
                }
                PersistCommand::Flush(done) => {
                    let _ = done.send(());
                }
                PersistCommand::Shutdown(done) => {
                    self.receiver.close();
                    while let Ok(next) = self.receiver.try_recv() {
                        match next {
                            PersistCommand::Save(snapshot) => self.write(&snapshot).await,
                            PersistCommand::Flush(tx) | PersistCommand::Shutdown(tx) => {
                                let _ = tx.send(());
                            }
                        }
                    }
                    let _ = done.send(());
                    break;
                }
            }
        }

        tracing::info!("CatalogPersister stopped");
    }

    async fn write(&self, snapshot: &CatalogSnapshot) {
        match self.store.save(snapshot).await {
            Ok(()) => tracing::debug!(
                buckets = snapshot.buckets.len(),
                exported_at = %snapshot.exported_at,
                "Catalog snapshot persisted"
            ),
            Err(e) => tracing::warn!(error = %e, "Failed to persist catalog snapshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryCatalogStore;
    use chrono::Utc;

    #[tokio::test]
    async fn test_flush_waits_for_queued_writes() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let (handle, _join) = CatalogPersister::spawn(store.clone());

        let first = CatalogSnapshot::empty(Utc::now());
        let mut second = CatalogSnapshot::empty(Utc::now());
        second.lru_order.push(crate::domain::voice::Platform::Web);

        handle.enqueue(first);
        handle.enqueue(second.clone());
        handle.flush().await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(second));
        assert!(store.save_count() >= 1);
    }

    #[tokio::test]
    async fn test_shutdown_drains_and_closes() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let (handle, join) = CatalogPersister::spawn(store.clone());

        let snapshot = CatalogSnapshot::empty(Utc::now());
        handle.enqueue(snapshot.clone());
        handle.shutdown().await.unwrap();
        join.await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(snapshot));
        assert!(handle.is_closed());
        assert!(handle.flush().await.is_err());
    }

    #[tokio::test]
    async fn test_failed_save_is_swallowed() {
        let store = Arc::new(crate::infrastructure::memory::FailingCatalogStore::default());
        let (handle, join) = CatalogPersister::spawn(store.clone());

        handle.enqueue(CatalogSnapshot::empty(Utc::now()));
        handle.flush().await.unwrap();
        assert_eq!(store.attempts(), 1);

        // 写入失败后队列仍可用
        handle.enqueue(CatalogSnapshot::empty(Utc::now()));
        handle.shutdown().await.unwrap();
        join.await.unwrap();
        assert_eq!(store.attempts(), 2);
    }
}
