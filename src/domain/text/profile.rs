//! 平台文本约束

use crate::domain::voice::Platform;

/// 平台对输入文本的约束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    /// 单次合成允许的最大字符数
    pub max_chars: usize,
    /// 是否需要剥离特殊字符（受限后端）
    pub strip_special: bool,
}

impl PlatformProfile {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            // Android TextToSpeech.getMaxSpeechInputLength()
            Platform::Android => Self::new(4000, false),
            Platform::Ios | Platform::Macos => Self::new(8000, false),
            Platform::Windows => Self::new(10_000, false),
            // espeak 系后端对符号处理不稳定
            Platform::Linux => Self::new(5000, true),
            Platform::Web => Self::new(32_767, true),
        }
    }

    const fn new(max_chars: usize, strip_special: bool) -> Self {
        Self {
            max_chars,
            strip_special,
        }
    }
}
