//! Markup Context - SSML 校验与清理

mod capabilities;
mod issues;
mod validator;

pub use capabilities::{MarkupCapabilities, PlatformMarkupSupport};
pub use issues::{IssueKind, Severity, ValidationIssue, ValidationReport};
pub use validator::{strip_tags, MarkupValidator};
