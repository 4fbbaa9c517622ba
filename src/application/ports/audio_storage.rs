//! Audio Storage Port - 出站端口
//!
//! 定义音频文件落盘与管理的抽象接口

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AudioInfo;
use crate::domain::audio::AudioFormat;

/// 音频存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid path {}: {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: String },

    #[error("Extension of {} does not match format {format}", .path.display())]
    ExtensionMismatch { path: PathBuf, format: AudioFormat },

    #[error("Permission denied: {}", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Insufficient space in {}: need {required} bytes, {available} available", .path.display())]
    InsufficientSpace {
        path: PathBuf,
        required: u64,
        available: u64,
    },

    #[error("File already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("File exists, skipped: {}", .path.display())]
    Skipped { path: PathBuf },

    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Verification failed for {}: {reason}", .path.display())]
    VerificationFailed { path: PathBuf, reason: String },

    #[error("IO error at {}: {message}", .path.display())]
    IoError { path: PathBuf, message: String },
}

impl StorageError {
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Self::IoError {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::InvalidPath { path, .. }
            | Self::ExtensionMismatch { path, .. }
            | Self::PermissionDenied { path }
            | Self::InsufficientSpace { path, .. }
            | Self::AlreadyExists { path }
            | Self::Skipped { path }
            | Self::FileNotFound { path }
            | Self::VerificationFailed { path, .. }
            | Self::IoError { path, .. } => path,
        }
    }
}

/// 目标文件已存在时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    Overwrite,
    /// 不写入，返回 `StorageError::Skipped`
    Skip,
    /// 追加 `-1`、`-2` ... 直到不冲突
    #[default]
    AutoRename,
    /// 不写入，返回 `StorageError::AlreadyExists`
    Error,
}

/// 保存选项
#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub format: AudioFormat,
    pub conflict: ConflictPolicy,
    /// 写入后重新读取并校验大小与格式
    pub verify: bool,
    /// 父目录不存在时自动创建
    pub create_dirs: bool,
}

impl SaveOptions {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            conflict: ConflictPolicy::default(),
            verify: true,
            create_dirs: true,
        }
    }

    pub fn with_conflict(mut self, conflict: ConflictPolicy) -> Self {
        self.conflict = conflict;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

/// 保存结果
#[derive(Debug, Clone, Serialize)]
pub struct SavedAudio {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub format: AudioFormat,
    /// 因冲突被改名
    pub renamed: bool,
    /// 校验时探测到的信息
    pub info: Option<AudioInfo>,
}

/// 已保存的音频文件
#[derive(Debug, Clone, Serialize)]
pub struct StoredAudioFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub format: Option<AudioFormat>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// 存储统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub file_count: u64,
    pub used_bytes: u64,
}

/// 可用空间探测
#[async_trait]
pub trait SpaceProbe: Send + Sync {
    async fn available_bytes(&self, dir: &Path) -> Result<u64, StorageError>;
}

/// Audio Storage Port - 出站端口
///
/// 管理输出目录下的音频文件
#[async_trait]
pub trait AudioStoragePort: Send + Sync {
    /// 输出根目录
    fn root(&self) -> &Path;

    /// 保存到根目录下的 `file_name`
    async fn save(
        &self,
        data: &[u8],
        file_name: &str,
        options: &SaveOptions,
    ) -> Result<SavedAudio, StorageError>;

    async fn read(&self, file_name: &str) -> Result<Vec<u8>, StorageError>;

    async fn delete(&self, file_name: &str) -> Result<(), StorageError>;

    async fn list(&self) -> Result<Vec<StoredAudioFile>, StorageError>;

    async fn stats(&self) -> Result<StorageStats, StorageError>;

    /// 清理残留的临时文件，返回删除数量
    async fn cleanup_temp_files(&self) -> Result<u64, StorageError>;
}
