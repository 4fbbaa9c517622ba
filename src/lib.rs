//! speechcache - 语音合成缓存与预处理流水线
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Text: 规范化、符号展开、分块
//! - Markup: SSML 校验与平台裁剪
//! - Synthesis: 合成参数与缓存 key
//! - Voice: 平台与音色目录
//! - Audio: 容器格式探测与 WAV 包装
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TtsEngine, AudioCache, VoiceCatalog, AudioStorage, Clock）
//! - Commands: 合成 / 保存
//! - Queries: 音色与统计
//!
//! 基础设施层 (infrastructure/):
//! - Memory: 音频缓存、音色目录缓存
//! - Worker: 目录快照持久化、定时刷新
//! - Persistence: Sled 目录快照
//! - Adapters: TTS Client, Voice Fetcher, Symphonia Prober, 文件输出

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
