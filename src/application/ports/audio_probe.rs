//! Audio Probe Port - 容器探测
//!
//! 读取时长 / 采样率 / 声道等元信息，不解码全部数据

use serde::Serialize;

use crate::domain::audio::{AudioFormat, FormatError};

/// 音频信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioInfo {
    pub format: AudioFormat,
    pub size_bytes: u64,
    pub duration_ms: Option<u64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

pub trait AudioProbePort: Send + Sync {
    fn probe(&self, data: &[u8]) -> Result<AudioInfo, FormatError>;
}
