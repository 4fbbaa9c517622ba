//! 无空格书写系统的分词空格
//!
//! 在脚本字符与拉丁字母的交界处插入空格（双向）

use serde::{Deserialize, Serialize};

/// 一个 Unicode 脚本区间（闭区间）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRange {
    pub name: String,
    pub start: u32,
    pub end: u32,
}

impl ScriptRange {
    pub fn new(name: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    #[inline]
    pub fn contains(&self, ch: char) -> bool {
        (self.start..=self.end).contains(&(ch as u32))
    }

    /// 默认区间：CJK 统一汉字、平假名、片假名、泰文
    pub fn defaults() -> Vec<ScriptRange> {
        vec![
            ScriptRange::new("cjk", 0x4E00, 0x9FFF),
            ScriptRange::new("hiragana", 0x3040, 0x309F),
            ScriptRange::new("katakana", 0x30A0, 0x30FF),
            ScriptRange::new("thai", 0x0E00, 0x0E7F),
        ]
    }
}

/// 对单个区间插入交界空格
fn space_boundaries(text: &str, range: &ScriptRange) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev: Option<char> = None;

    for ch in text.chars() {
        if let Some(p) = prev {
            let boundary = (range.contains(p) && ch.is_ascii_alphabetic())
                || (p.is_ascii_alphabetic() && range.contains(ch));
            if boundary {
                out.push(' ');
            }
        }
        out.push(ch);
        prev = Some(ch);
    }

    out
}

/// 依次对每个区间独立应用交界规则
pub fn apply_script_spacing(text: &str, ranges: &[ScriptRange]) -> String {
    ranges
        .iter()
        .fold(text.to_string(), |acc, range| space_boundaries(&acc, range))
}
