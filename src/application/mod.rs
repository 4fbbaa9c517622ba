//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、AudioCache、VoiceCatalog、AudioStorage 等）
//! - commands: 合成 / 保存命令及处理器
//! - queries: 音色与统计查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::{SaveAudioHandler, SynthesizeHandler},
    SaveAudioCommand, SaveAudioResponse, SynthesizeCommand, SynthesizeResponse,
    SynthesizedChunk,
};

pub use error::ApplicationError;

pub use ports::{
    // Audio cache
    AudioCachePort,
    CacheStats,
    // Audio files
    AudioInfo,
    AudioProbePort,
    AudioStoragePort,
    ConflictPolicy,
    SaveOptions,
    SavedAudio,
    StorageError,
    // Clock
    Clock,
    SystemClock,
    // TTS engine
    SynthesisRequest,
    TtsEnginePort,
    TtsError,
    // Voice catalog
    CatalogError,
    CatalogStats,
    VoiceCatalogPort,
};

pub use queries::{
    handlers::{
        FindVoiceHandler, GetCacheStatsHandler, GetCatalogStatsHandler, ListSavedAudioHandler,
        ListVoicesHandler,
    },
    FindVoice, GetCacheStats, GetCatalogStats, ListSavedAudio, ListVoices,
};
