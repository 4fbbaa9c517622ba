//! Synthesis Context - Value Objects

use serde::{Deserialize, Serialize};

use crate::domain::audio::AudioFormat;

/// 合成参数
///
/// rate / pitch / volume 以 1.0 为基准
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisParams {
    /// 语言或音色标识（如 `en-US` 或 `en-US-AriaNeural`）
    pub voice: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub format: AudioFormat,
    /// 文本是否为 SSML 标记
    pub markup: bool,
}

impl SynthesisParams {
    pub fn new(voice: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            format: AudioFormat::default(),
            markup: false,
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_markup(mut self, markup: bool) -> Self {
        self.markup = markup;
        self
    }

    /// 校验参数范围
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.voice.trim().is_empty() {
            return Err("voice must not be empty");
        }
        if !(0.1..=4.0).contains(&self.rate) {
            return Err("rate must be between 0.1 and 4.0");
        }
        if !(0.1..=4.0).contains(&self.pitch) {
            return Err("pitch must be between 0.1 and 4.0");
        }
        if !(0.0..=2.0).contains(&self.volume) {
            return Err("volume must be between 0.0 and 2.0");
        }
        Ok(())
    }
}

/// 参数保留两位小数，以整数百分位参与哈希
#[inline]
fn centis(value: f32) -> i64 {
    let rounded = (value as f64 * 100.0).round();
    if rounded.is_finite() {
        rounded as i64
    } else {
        0
    }
}

/// 缓存 key 使用的文本规范化：折叠空白、去首尾、大小写折叠
pub fn normalize_for_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 内容寻址缓存 key
///
/// md5(规范化文本 | 音色 | rate | pitch | volume | 格式 | markup)，32 位十六进制
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(text: &str, params: &SynthesisParams) -> Self {
        let canonical = format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
            normalize_for_key(text),
            params.voice.trim().to_lowercase(),
            centis(params.rate),
            centis(params.pitch),
            centis(params.volume),
            params.format,
            params.markup as u8,
        );
        let digest = md5::compute(canonical.as_bytes());
        Self(format!("{:x}", digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_fixed_length_hex() {
        let key = CacheKey::derive("Hello", &SynthesisParams::new("en-US"));
        assert_eq!(key.as_str().len(), 32);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_is_deterministic() {
        let params = SynthesisParams::new("en-US").with_rate(1.25);
        let a = CacheKey::derive("Hello world", &params);
        let b = CacheKey::derive("Hello world", &params);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_whitespace_and_case() {
        let params = SynthesisParams::new("en-US");
        let a = CacheKey::derive("Hello world", &params);
        let b = CacheKey::derive("  hello \t  WORLD\n", &params);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_folds_voice_case() {
        let a = CacheKey::derive("hi", &SynthesisParams::new("en-US"));
        let b = CacheKey::derive("hi", &SynthesisParams::new("en-us"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_rounds_parameters() {
        let text = "hi";
        let a = CacheKey::derive(text, &SynthesisParams::new("en").with_rate(1.004));
        let b = CacheKey::derive(text, &SynthesisParams::new("en").with_rate(1.0));
        assert_eq!(a, b);

        let c = CacheKey::derive(text, &SynthesisParams::new("en").with_rate(1.01));
        assert_ne!(a, c);
    }

    #[test]
    fn test_key_distinguishes_format_and_markup() {
        let base = SynthesisParams::new("en");
        let wav = CacheKey::derive("hi", &base);
        let mp3 = CacheKey::derive("hi", &base.clone().with_format(AudioFormat::Mp3));
        let ssml = CacheKey::derive("hi", &base.clone().with_markup(true));
        assert_ne!(wav, mp3);
        assert_ne!(wav, ssml);
        assert_ne!(mp3, ssml);
    }

    #[test]
    fn test_params_validation() {
        assert!(SynthesisParams::new("en").validate().is_ok());
        assert!(SynthesisParams::new(" ").validate().is_err());
        assert!(SynthesisParams::new("en").with_rate(5.0).validate().is_err());
        assert!(SynthesisParams::new("en").with_volume(-0.5).validate().is_err());
    }
}
