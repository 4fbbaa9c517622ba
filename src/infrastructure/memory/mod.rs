//! Memory Layer - In-Memory State Management
//!
//! 音频缓存、音色目录缓存与内存快照存储

mod audio_cache;
mod catalog_store;
mod voice_catalog_cache;

pub use audio_cache::{AudioCacheConfig, InMemoryAudioCache};
pub use catalog_store::InMemoryCatalogStore;
#[cfg(test)]
pub use catalog_store::FailingCatalogStore;
pub use voice_catalog_cache::{RefreshOutcome, VoiceCatalogCache, VoiceCatalogConfig};
