//! 平台 SSML 能力矩阵

use std::collections::{HashMap, HashSet};

use crate::domain::voice::Platform;

/// 单个平台的标签支持情况
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformMarkupSupport {
    /// 允许的标签（小写）
    pub supported: HashSet<String>,
    /// 名义上支持但表现不稳定的标签
    pub unreliable: HashSet<String>,
}

impl PlatformMarkupSupport {
    pub fn new(supported: &[&str], unreliable: &[&str]) -> Self {
        Self {
            supported: supported.iter().map(|t| t.to_string()).collect(),
            unreliable: unreliable.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// 平台 → 标签白名单
#[derive(Debug, Clone)]
pub struct MarkupCapabilities {
    platforms: HashMap<Platform, PlatformMarkupSupport>,
}

impl MarkupCapabilities {
    pub fn empty() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    pub fn with_platform(mut self, platform: Platform, support: PlatformMarkupSupport) -> Self {
        self.platforms.insert(platform, support);
        self
    }

    pub fn supports(&self, platform: Platform, tag: &str) -> bool {
        self.platforms
            .get(&platform)
            .map_or(false, |s| s.supported.contains(&tag.to_ascii_lowercase()))
    }

    pub fn is_unreliable(&self, platform: Platform, tag: &str) -> bool {
        self.platforms
            .get(&platform)
            .map_or(false, |s| s.unreliable.contains(&tag.to_ascii_lowercase()))
    }

    pub fn support(&self, platform: Platform) -> Option<&PlatformMarkupSupport> {
        self.platforms.get(&platform)
    }
}

impl Default for MarkupCapabilities {
    fn default() -> Self {
        let apple = PlatformMarkupSupport::new(
            &["speak", "p", "s", "break", "prosody", "say-as", "emphasis", "sub", "phoneme"],
            &["emphasis"],
        );

        Self::empty()
            .with_platform(
                Platform::Android,
                PlatformMarkupSupport::new(
                    &["speak", "p", "s", "break", "prosody", "say-as", "emphasis", "sub"],
                    &["emphasis", "say-as"],
                ),
            )
            .with_platform(Platform::Ios, apple.clone())
            .with_platform(Platform::Macos, apple)
            .with_platform(
                Platform::Windows,
                PlatformMarkupSupport::new(
                    &[
                        "speak", "p", "s", "break", "prosody", "say-as", "emphasis", "sub",
                        "phoneme", "voice", "lang", "mark", "audio",
                    ],
                    &[],
                ),
            )
            .with_platform(
                Platform::Linux,
                PlatformMarkupSupport::new(
                    &[
                        "speak", "p", "s", "break", "prosody", "say-as", "emphasis", "sub",
                        "voice", "audio",
                    ],
                    &["say-as"],
                ),
            )
            .with_platform(
                Platform::Web,
                PlatformMarkupSupport::new(&["speak", "p", "s", "break"], &["break"]),
            )
    }
}
