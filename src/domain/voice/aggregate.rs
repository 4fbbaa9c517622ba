//! Voice Context - Aggregate Root

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::VoiceDescriptor;

/// 单个平台的音色目录桶
///
/// 不变量:
/// - 桶要么完整存在，要么不存在（不建模部分列表）
/// - 桶只能整体替换，不能原地修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePlatformBucket {
    voices: Vec<VoiceDescriptor>,
    fetched_at: DateTime<Utc>,
}

impl VoicePlatformBucket {
    pub fn new(voices: Vec<VoiceDescriptor>, fetched_at: DateTime<Utc>) -> Self {
        Self { voices, fetched_at }
    }

    /// 是否已过期
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at > ttl
    }

    pub fn find(&self, name: &str) -> Option<&VoiceDescriptor> {
        self.voices
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }

    // Getters
    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_expiry() {
        let t0 = Utc::now();
        let bucket = VoicePlatformBucket::new(Vec::new(), t0);
        let ttl = Duration::hours(1);

        assert!(!bucket.is_expired(t0 + Duration::minutes(59), ttl));
        assert!(bucket.is_expired(t0 + Duration::minutes(61), ttl));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let voice = VoiceDescriptor::new("en-US-AriaNeural", "en-US").unwrap();
        let bucket = VoicePlatformBucket::new(vec![voice], Utc::now());
        assert!(bucket.find("en-us-arianeural").is_some());
        assert!(bucket.find("missing").is_none());
    }
}
