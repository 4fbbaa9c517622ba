//! Text Preparer
//!
//! 固定顺序的预处理流水线：
//! 1. 空白规范化
//! 2. 符号展开
//! 3. 平台字符剥离
//! 4. 脚本分词空格
//! 5. 长度限制（可选分块）

use super::chunker::split_into_chunks;
use super::expansion::{expand_symbols, normalize_whitespace, strip_special_chars};
use super::profile::PlatformProfile;
use super::script_spacing::{apply_script_spacing, ScriptRange};
use super::TextError;
use crate::domain::voice::Platform;

/// 预处理配置
#[derive(Debug, Clone)]
pub struct TextPreparerConfig {
    /// 是否展开 URL / 邮箱 / 电话 / 符号
    pub expand_symbols: bool,
    /// 是否展开英文缩写
    pub expand_abbreviations: bool,
    /// 需要插入分词空格的脚本区间
    pub script_ranges: Vec<ScriptRange>,
    /// 覆盖平台默认的最大字符数
    pub max_chars_override: Option<usize>,
}

impl Default for TextPreparerConfig {
    fn default() -> Self {
        Self {
            expand_symbols: true,
            expand_abbreviations: true,
            script_ranges: ScriptRange::defaults(),
            max_chars_override: None,
        }
    }
}

/// 预处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedText {
    /// 完整的规范化文本
    pub text: String,
    /// 实际送去合成的块；未分块时只有一个元素
    pub chunks: Vec<String>,
}

impl PreparedText {
    pub fn is_chunked(&self) -> bool {
        self.chunks.len() > 1
    }
}

/// 文本预处理器
#[derive(Debug, Clone, Default)]
pub struct TextPreparer {
    config: TextPreparerConfig,
}

impl TextPreparer {
    pub fn new(config: TextPreparerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TextPreparerConfig {
        &self.config
    }

    /// 平台的有效字符上限
    pub fn max_chars(&self, platform: Platform) -> usize {
        self.config
            .max_chars_override
            .unwrap_or_else(|| PlatformProfile::for_platform(platform).max_chars)
    }

    /// 只执行 1-4 阶段，不做长度检查
    pub fn normalize(&self, text: &str, platform: Platform) -> String {
        let profile = PlatformProfile::for_platform(platform);

        let mut out = normalize_whitespace(text);
        if self.config.expand_symbols {
            out = expand_symbols(&out, self.config.expand_abbreviations);
        }
        if profile.strip_special {
            out = strip_special_chars(&out);
        }
        if !self.config.script_ranges.is_empty() {
            out = apply_script_spacing(&out, &self.config.script_ranges);
        }
        out
    }

    /// 完整流水线
    ///
    /// 超出平台上限时：`chunking` 为 true 则分块，否则返回 `LengthExceeded`
    pub fn prepare(
        &self,
        text: &str,
        platform: Platform,
        chunking: bool,
    ) -> Result<PreparedText, TextError> {
        let normalized = self.normalize(text, platform);
        if normalized.is_empty() {
            return Err(TextError::Empty);
        }

        let limit = self.max_chars(platform);
        let length = normalized.chars().count();

        let chunks = if length <= limit {
            vec![normalized.clone()]
        } else if chunking {
            let chunks = split_into_chunks(&normalized, limit);
            tracing::debug!(
                platform = %platform,
                length = length,
                limit = limit,
                chunks = chunks.len(),
                "Text split into chunks"
            );
            chunks
        } else {
            return Err(TextError::LengthExceeded { length, limit });
        };

        Ok(PreparedText {
            text: normalized,
            chunks,
        })
    }

    /// 分块（不做其它预处理）
    pub fn split_into_chunks(&self, text: &str, max_length: usize) -> Vec<String> {
        split_into_chunks(text, max_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        let preparer = TextPreparer::default();
        let prepared = preparer
            .prepare("  Email  me@example.com & visit https://www.rust-lang.org ", Platform::Windows, false)
            .unwrap();
        assert_eq!(
            prepared.text,
            "Email me at example dot com and visit rust-lang.org"
        );
        assert_eq!(prepared.chunks, vec![prepared.text.clone()]);
    }

    #[test]
    fn test_constrained_platform_strips_specials() {
        let preparer = TextPreparer::default();
        let windows = preparer.normalize("ok * [done]", Platform::Windows);
        let linux = preparer.normalize("ok * [done]", Platform::Linux);
        assert_eq!(windows, "ok * [done]");
        assert_eq!(linux, "ok done");
    }

    #[test]
    fn test_script_spacing_applied() {
        let preparer = TextPreparer::default();
        let prepared = preparer.prepare("我爱Rust", Platform::Android, false).unwrap();
        assert_eq!(prepared.text, "我爱 Rust");
    }

    #[test]
    fn test_empty_text_rejected() {
        let preparer = TextPreparer::default();
        assert_eq!(
            preparer.prepare(" \n\t ", Platform::Windows, true),
            Err(TextError::Empty)
        );
    }

    #[test]
    fn test_length_exceeded_without_chunking() {
        let preparer = TextPreparer::new(TextPreparerConfig {
            max_chars_override: Some(10),
            ..Default::default()
        });
        let result = preparer.prepare("This sentence is too long.", Platform::Windows, false);
        assert_eq!(
            result,
            Err(TextError::LengthExceeded {
                length: 26,
                limit: 10
            })
        );
    }

    #[test]
    fn test_length_exceeded_with_chunking() {
        let preparer = TextPreparer::new(TextPreparerConfig {
            max_chars_override: Some(12),
            ..Default::default()
        });
        let prepared = preparer
            .prepare("First one. Second one. Third.", Platform::Windows, true)
            .unwrap();
        assert!(prepared.is_chunked());
        assert!(prepared.chunks.iter().all(|c| c.chars().count() <= 12));
        assert_eq!(prepared.chunks.join(" "), prepared.text);
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let preparer = TextPreparer::default();
        let once = preparer.normalize("A & B @ home", Platform::Windows);
        let twice = preparer.normalize(&once, Platform::Windows);
        assert_eq!(once, twice);
    }
}
