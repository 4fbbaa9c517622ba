//! 文本分块
//!
//! 把长文本切成后端可接受的块：先按句末标点分句，再贪心打包；
//! 超长句子按词切分，超长单词按字符硬切

/// 半角句末标点（后面需跟空白或文本结束才算句末）
#[inline]
fn is_strong_delimiter(ch: char) -> bool {
    matches!(ch, '.' | '?' | '!' | '…')
}

/// 全角句末标点（无论后面是什么都分句）
#[inline]
fn is_full_width_delimiter(ch: char) -> bool {
    matches!(ch, '。' | '？' | '！')
}

/// 一个句子，以及它和前一个句子之间原本是否有空格
#[derive(Debug)]
struct Sentence {
    text: String,
    spaced: bool,
}

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 分句（输入须已折叠空白）
fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut spaced = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);

        let next = chars.peek().copied();
        let ends_sentence = if is_full_width_delimiter(ch) {
            true
        } else if is_strong_delimiter(ch) {
            next.map_or(true, char::is_whitespace)
        } else {
            false
        };

        if ends_sentence {
            // 吃掉句间的一个空格，并记录下来
            let followed_by_space = matches!(next, Some(' '));
            if followed_by_space {
                chars.next();
            }
            sentences.push(Sentence {
                text: std::mem::take(&mut current),
                spaced,
            });
            spaced = followed_by_space;
        }
    }

    if !current.is_empty() {
        sentences.push(Sentence {
            text: current,
            spaced,
        });
    }

    sentences
}

/// 把超长单词按字符边界硬切
fn hard_split(word: &str, max_length: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_length)
        .map(|piece| piece.iter().collect())
        .collect()
}

/// 贪心打包器
struct Packer {
    max_length: usize,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
}

impl Packer {
    fn new(max_length: usize) -> Self {
        Self {
            max_length,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    /// 追加一段文本；`spaced` 表示与前文之间是否需要空格
    fn push(&mut self, piece: &str, spaced: bool) {
        let piece_len = char_len(piece);
        if self.current.is_empty() {
            self.current.push_str(piece);
            self.current_len = piece_len;
            return;
        }

        let sep = usize::from(spaced);
        if self.current_len + sep + piece_len <= self.max_length {
            if spaced {
                self.current.push(' ');
            }
            self.current.push_str(piece);
            self.current_len += sep + piece_len;
        } else {
            self.flush();
            self.current.push_str(piece);
            self.current_len = piece_len;
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
            self.current_len = 0;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

/// 按最大长度（字符数）分块
///
/// 从不失败：返回非空序列，每块长度 `<= max_length`（`max_length` 至少按 1 处理）。
/// 未发生单词硬切时，用单个空格连接各块即可还原折叠空白后的原文
pub fn split_into_chunks(text: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return vec![String::new()];
    }

    let mut packer = Packer::new(max_length);

    for sentence in split_sentences(&normalized) {
        if char_len(&sentence.text) <= max_length {
            packer.push(&sentence.text, sentence.spaced);
            continue;
        }

        // 超长句子：按词切分
        packer.flush();
        for word in sentence.text.split(' ').filter(|w| !w.is_empty()) {
            if char_len(word) <= max_length {
                packer.push(word, true);
            } else {
                packer.flush();
                for piece in hard_split(word, max_length) {
                    packer.push(&piece, false);
                    packer.flush();
                }
            }
        }
        packer.flush();
    }

    let chunks = packer.finish();
    if chunks.is_empty() {
        vec![String::new()]
    } else {
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "The quick brown fox jumps over the lazy dog. It was not amused! \
        Why would it be? The fox, however, was   delighted with itself and ran off \
        into the forest.  Nobody saw it again…  The end.";

    fn normalized(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_chunks_respect_max_length_and_rejoin() {
        for max in [10usize, 25, 40, 80, 500] {
            let chunks = split_into_chunks(SAMPLE, max);
            assert!(!chunks.is_empty());
            for chunk in &chunks {
                assert!(chunk.chars().count() <= max, "chunk {:?} > {}", chunk, max);
            }
            assert_eq!(chunks.join(" "), normalized(SAMPLE), "max = {}", max);
        }
    }

    #[test]
    fn test_sentences_are_packed_greedily() {
        let chunks = split_into_chunks("One. Two. Three. Four.", 10);
        assert_eq!(chunks, vec!["One. Two.", "Three.", "Four."]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(split_into_chunks("  Hello   world ", 100), vec!["Hello world"]);
    }

    #[test]
    fn test_long_word_is_hard_split() {
        let chunks = split_into_chunks("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
        assert_eq!(chunks.concat(), "abcdefghij");
    }

    #[test]
    fn test_multibyte_hard_split_on_char_boundaries() {
        let chunks = split_into_chunks("汉字汉字汉字汉", 3);
        assert_eq!(chunks, vec!["汉字汉", "字汉字", "汉"]);
    }

    #[test]
    fn test_full_width_delimiters_split_without_spaces() {
        let chunks = split_into_chunks("第一句。第二句。第三句。", 8);
        assert_eq!(chunks, vec!["第一句。第二句。", "第三句。"]);
    }

    #[test]
    fn test_decimal_point_does_not_split() {
        let chunks = split_into_chunks("Pi is 3.14 roughly. Yes.", 20);
        assert_eq!(chunks, vec!["Pi is 3.14 roughly.", "Yes."]);
    }

    #[test]
    fn test_empty_and_zero_max_never_fail() {
        assert_eq!(split_into_chunks("", 10), vec![""]);
        assert_eq!(split_into_chunks("   ", 10), vec![""]);
        let chunks = split_into_chunks("ab cd", 0);
        assert_eq!(chunks, vec!["a", "b", "c", "d"]);
    }
}
