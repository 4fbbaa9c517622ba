//! Audio Context - 容器格式

use serde::{Deserialize, Serialize};

use super::FormatError;

/// 音频容器格式
///
/// 声明顺序即签名探测的优先级顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// RIFF/WAVE
    #[default]
    Wav,
    Flac,
    /// OGG 容器（Opus / Vorbis）
    Ogg,
    /// MP4/M4A (ISO BMFF)
    M4a,
    Mp3,
    /// ADTS 封装的 AAC
    Aac,
}

impl AudioFormat {
    /// 探测优先级顺序
    pub const DETECTION_ORDER: [AudioFormat; 6] = [
        AudioFormat::Wav,
        AudioFormat::Flac,
        AudioFormat::Ogg,
        AudioFormat::M4a,
        AudioFormat::Mp3,
        AudioFormat::Aac,
    ];

    /// 首选文件扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
            AudioFormat::M4a => "m4a",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Aac => "aac",
        }
    }

    /// 该格式接受的全部扩展名（小写）
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            AudioFormat::Wav => &["wav", "wave"],
            AudioFormat::Flac => &["flac"],
            AudioFormat::Ogg => &["ogg", "oga", "opus"],
            AudioFormat::M4a => &["m4a", "mp4"],
            AudioFormat::Mp3 => &["mp3"],
            AudioFormat::Aac => &["aac"],
        }
    }

    /// 扩展名是否与格式匹配（忽略大小写）
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.accepted_extensions().iter().any(|e| *e == ext)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Aac => "audio/aac",
        }
    }

    /// 是否为有损压缩格式（用于估算磁盘需求）
    pub fn is_compressed(&self) -> bool {
        !matches!(self, AudioFormat::Wav | AudioFormat::Flac)
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        AudioFormat::DETECTION_ORDER
            .into_iter()
            .find(|f| f.matches_extension(&lower))
            .ok_or_else(|| FormatError::UnsupportedFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_aliases() {
        assert_eq!("WAV".parse::<AudioFormat>().unwrap(), AudioFormat::Wav);
        assert_eq!("opus".parse::<AudioFormat>().unwrap(), AudioFormat::Ogg);
        assert_eq!("mp4".parse::<AudioFormat>().unwrap(), AudioFormat::M4a);
        assert!("aiff".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&AudioFormat::Mp3).unwrap();
        assert_eq!(json, "\"mp3\"");
    }
}
