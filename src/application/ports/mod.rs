//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_cache;
mod audio_probe;
mod audio_storage;
mod clock;
mod tts_engine;
mod voice_catalog;

pub use audio_cache::{AudioCachePort, CacheStats};
pub use audio_probe::{AudioInfo, AudioProbePort};
pub use audio_storage::{
    AudioStoragePort, ConflictPolicy, SaveOptions, SavedAudio, SpaceProbe, StorageError,
    StorageStats, StoredAudioFile,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use tts_engine::{EngineInfo, SynthesisRequest, TtsEnginePort, TtsError};
pub use voice_catalog::{
    CatalogError, CatalogSnapshot, CatalogStats, CatalogStorePort, PersistenceError,
    VoiceCatalogPort, VoiceFetcherPort,
};
