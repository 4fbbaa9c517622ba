//! Synthesis Commands - 合成与保存命令

use crate::application::ports::{ConflictPolicy, SavedAudio};
use crate::domain::markup::ValidationIssue;
use crate::domain::synthesis::{CacheKey, SynthesisParams};
use crate::domain::voice::Platform;

/// 合成命令
#[derive(Debug, Clone)]
pub struct SynthesizeCommand {
    pub text: String,
    pub params: SynthesisParams,
    pub platform: Platform,
    /// 超长文本是否分块；否则直接报错
    pub chunking: bool,
}

impl SynthesizeCommand {
    pub fn new(text: impl Into<String>, params: SynthesisParams, platform: Platform) -> Self {
        Self {
            text: text.into(),
            params,
            platform,
            chunking: true,
        }
    }

    pub fn with_chunking(mut self, chunking: bool) -> Self {
        self.chunking = chunking;
        self
    }
}

/// 单个分块的合成结果
#[derive(Debug, Clone)]
pub struct SynthesizedChunk {
    pub index: usize,
    /// 实际送去合成的文本
    pub text: String,
    pub cache_key: CacheKey,
    pub audio: Vec<u8>,
    pub cache_hit: bool,
}

/// 合成响应
#[derive(Debug, Clone)]
pub struct SynthesizeResponse {
    pub chunks: Vec<SynthesizedChunk>,
    /// 标记校验的非致命问题
    pub warnings: Vec<ValidationIssue>,
}

impl SynthesizeResponse {
    pub fn cache_hits(&self) -> usize {
        self.chunks.iter().filter(|c| c.cache_hit).count()
    }

    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.audio.len()).sum()
    }
}

/// 合成并保存命令
#[derive(Debug, Clone)]
pub struct SaveAudioCommand {
    pub synth: SynthesizeCommand,
    /// 不指定时根据文本生成
    pub file_name: Option<String>,
    pub conflict: ConflictPolicy,
    pub verify: bool,
}

impl SaveAudioCommand {
    pub fn new(synth: SynthesizeCommand) -> Self {
        Self {
            synth,
            file_name: None,
            conflict: ConflictPolicy::default(),
            verify: true,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_conflict(mut self, conflict: ConflictPolicy) -> Self {
        self.conflict = conflict;
        self
    }
}

/// 保存响应
#[derive(Debug, Clone)]
pub struct SaveAudioResponse {
    /// 每个分块一个文件
    pub files: Vec<SavedAudio>,
    pub cache_hits: usize,
    pub warnings: Vec<ValidationIssue>,
}
