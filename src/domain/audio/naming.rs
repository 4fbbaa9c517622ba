//! 输出文件命名

use super::AudioFormat;

const MAX_WORDS: usize = 5;
const MAX_STEM_CHARS: usize = 40;

/// 根据文本生成文件名：前几个词 + 文本哈希前 8 位 + 扩展名
///
/// 同样的文本总是得到同样的文件名
pub fn suggest_file_name(text: &str, format: AudioFormat) -> String {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .take(MAX_WORDS)
        .collect();

    let mut stem: String = words.join("-").chars().take(MAX_STEM_CHARS).collect();
    while stem.ends_with('-') {
        stem.pop();
    }
    if stem.is_empty() {
        stem.push_str("speech");
    }

    let digest = format!("{:x}", md5::compute(text.trim().as_bytes()));
    format!("{}-{}.{}", stem, &digest[..8], format.extension())
}

/// 分块文件名：`name-001.wav`
pub fn chunk_file_name(file_name: &str, index: usize) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{:03}.{}", stem, index + 1, ext),
        _ => format!("{}-{:03}", file_name, index + 1),
    }
}
