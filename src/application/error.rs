//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{CatalogError, StorageError, TtsError};
use crate::domain::markup::ValidationIssue;
use crate::domain::text::TextError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 输入校验失败，带上全部问题
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        issues: Vec<ValidationIssue>,
    },

    /// 文本预处理失败
    #[error("Text error: {0}")]
    TextError(#[from] TextError),

    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 合成引擎错误
    #[error("TTS engine error: {0}")]
    EngineError(#[from] TtsError),

    /// 音色目录错误
    #[error("Voice catalog error: {0}")]
    CatalogError(#[from] CatalogError),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建验证错误（无结构化问题）
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            issues: Vec::new(),
        }
    }

    /// 创建带问题列表的验证错误
    pub fn invalid_markup(issues: Vec<ValidationIssue>) -> Self {
        let message = issues
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self::ValidationError { message, issues }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// 校验问题（非校验错误为空）
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::ValidationError { issues, .. } => issues,
            _ => &[],
        }
    }

    /// 面向终端用户的一句话原因
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationError { issues, message } => match issues.first() {
                Some(first) if issues.len() > 1 => format!(
                    "The markup is invalid: {} (and {} more problems)",
                    first.message,
                    issues.len() - 1
                ),
                Some(first) => format!("The markup is invalid: {}", first.message),
                None => format!("The request is invalid: {}", message),
            },
            Self::TextError(TextError::Empty) => "There is no text to speak".to_string(),
            Self::TextError(TextError::LengthExceeded { length, limit }) => format!(
                "The text is too long for this platform ({} of {} characters)",
                length, limit
            ),
            Self::NotFound { resource_type, id } => format!("{} '{}' was not found", resource_type, id),
            Self::EngineError(TtsError::VoiceNotFound(_)) => {
                "Voice unavailable on this platform".to_string()
            }
            Self::EngineError(TtsError::Timeout) => {
                "The speech service did not respond in time".to_string()
            }
            Self::EngineError(TtsError::NetworkError(_)) => {
                "The speech service is unreachable".to_string()
            }
            Self::EngineError(TtsError::UnsupportedFormat(format)) => {
                format!("The speech service cannot produce {} audio", format)
            }
            Self::EngineError(_) => "The speech service failed to synthesize the text".to_string(),
            Self::CatalogError(CatalogError::UnsupportedPlatform(platform)) => {
                format!("Voices are not available on {}", platform)
            }
            Self::CatalogError(_) => "The voice list could not be loaded".to_string(),
            Self::StorageError(err) => match err {
                StorageError::InsufficientSpace { .. } => {
                    "Not enough disk space to save the audio".to_string()
                }
                StorageError::PermissionDenied { path } => {
                    format!("No permission to write to {}", path.display())
                }
                StorageError::AlreadyExists { path } => {
                    format!("{} already exists", path.display())
                }
                StorageError::Skipped { path } => {
                    format!("{} already exists and was left unchanged", path.display())
                }
                StorageError::InvalidPath { path, .. } | StorageError::ExtensionMismatch { path, .. } => {
                    format!("{} is not a valid destination", path.display())
                }
                StorageError::FileNotFound { path } => format!("{} does not exist", path.display()),
                _ => "The audio file could not be saved".to_string(),
            },
            Self::InternalError(_) => "An unexpected error occurred".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::markup::IssueKind;

    #[test]
    fn test_user_message_for_voice_not_found() {
        let err = ApplicationError::from(TtsError::VoiceNotFound("xx-XX".to_string()));
        assert_eq!(err.user_message(), "Voice unavailable on this platform");
    }

    #[test]
    fn test_invalid_markup_keeps_every_issue() {
        let issues = vec![
            ValidationIssue::error(IssueKind::MalformedMarkup, "<p> is never closed", 7),
            ValidationIssue::error(IssueKind::MissingRootElement, "no root", 0),
        ];
        let err = ApplicationError::invalid_markup(issues);
        assert_eq!(err.issues().len(), 2);
        assert!(err.user_message().contains("<p> is never closed"));
        assert!(err.user_message().contains("1 more"));
    }

    #[test]
    fn test_text_errors_are_readable() {
        let err = ApplicationError::from(TextError::LengthExceeded {
            length: 12,
            limit: 10,
        });
        assert_eq!(
            err.user_message(),
            "The text is too long for this platform (12 of 10 characters)"
        );
    }
}
