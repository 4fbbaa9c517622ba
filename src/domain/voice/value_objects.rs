//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

use super::VoiceError;

/// 目标平台
///
/// 音色目录按平台分桶缓存
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Linux,
    Macos,
    Windows,
    Web,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Android,
        Platform::Ios,
        Platform::Linux,
        Platform::Macos,
        Platform::Windows,
        Platform::Web,
    ];

    /// 当前进程所在的平台
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_arch = "wasm32") {
            Platform::Web
        } else {
            Platform::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
            Platform::Web => "web",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = VoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            "linux" => Ok(Platform::Linux),
            "macos" | "osx" => Ok(Platform::Macos),
            "windows" => Ok(Platform::Windows),
            "web" => Ok(Platform::Web),
            _ => Err(VoiceError::UnknownPlatform(s.to_string())),
        }
    }
}

/// 音色性别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Neutral,
    #[default]
    Unknown,
}

/// 音色描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// 后端使用的音色名
    pub name: String,
    /// BCP-47 语言标签
    pub locale: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub is_neural: bool,
    pub display_name: String,
}

impl VoiceDescriptor {
    pub fn new(name: impl Into<String>, locale: impl Into<String>) -> Result<Self, VoiceError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(VoiceError::InvalidDescriptor("voice name is empty".to_string()));
        }
        let locale = locale.into();
        if locale.trim().is_empty() {
            return Err(VoiceError::InvalidDescriptor(format!(
                "voice {} has empty locale",
                name
            )));
        }
        Ok(Self {
            display_name: name.clone(),
            name,
            locale,
            gender: Gender::Unknown,
            is_neural: false,
        })
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_neural(mut self, is_neural: bool) -> Self {
        self.is_neural = is_neural;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// locale 前缀匹配（忽略大小写，`en` 匹配 `en-US`）
    pub fn matches_locale(&self, locale: &str) -> bool {
        let wanted = locale.trim().to_ascii_lowercase().replace('_', "-");
        let own = self.locale.to_ascii_lowercase().replace('_', "-");
        own == wanted || own.starts_with(&format!("{}-", wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trip_names() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
        assert!("amiga".parse::<Platform>().is_err());
    }

    #[test]
    fn test_descriptor_rejects_empty_name() {
        assert!(VoiceDescriptor::new("", "en-US").is_err());
        assert!(VoiceDescriptor::new("aria", " ").is_err());
    }

    #[test]
    fn test_locale_prefix_match() {
        let voice = VoiceDescriptor::new("aria", "en-US").unwrap();
        assert!(voice.matches_locale("en"));
        assert!(voice.matches_locale("EN_us"));
        assert!(!voice.matches_locale("e"));
        assert!(!voice.matches_locale("fr"));
    }
}
