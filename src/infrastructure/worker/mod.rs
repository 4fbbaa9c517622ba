//! Worker Layer - Background Task Processing
//!
//! 目录快照持久化与定时刷新

mod catalog_persister;
mod catalog_refresher;

pub use catalog_persister::{CatalogPersister, PersistHandle};
pub use catalog_refresher::{CatalogRefresher, CatalogRefresherConfig, RefreshHandle};
