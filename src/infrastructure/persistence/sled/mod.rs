//! Sled 持久化

mod catalog_store;

pub use catalog_store::SledCatalogStore;
