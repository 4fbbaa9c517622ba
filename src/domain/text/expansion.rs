//! 符号展开
//!
//! URL / 邮箱 / 电话号码 / 缩写 / 符号表，按固定顺序执行

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static URL_WITH_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:https?|ftp)://(?:www\.)?(\S+)").expect("valid url regex"));

static BARE_WWW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bwww\.(\S+)").expect("valid www regex"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Za-z0-9._%+-]+)@([A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+)\b")
        .expect("valid email regex")
});

static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[ -]?)?(?:\(\d{2,4}\) ?|\b\d{2,4}[-. ])\d{3,4}[-. ]\d{3,4}\b")
        .expect("valid phone regex")
});

/// 英文常见缩写
static ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\be\.g\.", "for example"),
        (r"\bi\.e\.", "that is"),
        (r"\betc\.", "et cetera"),
        (r"\bvs\.", "versus"),
        (r"\bDr\.", "Doctor"),
        (r"\bMrs\.", "Missus"),
        (r"\bMr\.", "Mister"),
    ]
    .into_iter()
    .map(|(pattern, word)| (Regex::new(pattern).expect("valid abbreviation regex"), word))
    .collect()
});

/// 符号 → 朗读文本
const SYMBOLS: &[(char, &str)] = &[
    ('&', "and"),
    ('@', "at"),
    ('#', "hash"),
    ('%', "percent"),
    ('+', "plus"),
    ('=', "equals"),
    ('<', "less than"),
    ('>', "greater than"),
    ('|', "pipe"),
    ('~', "tilde"),
    ('^', "caret"),
    ('`', "backtick"),
];

/// 折叠连续空白并去除首尾空白
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 去掉 URL 的协议与 `www.` 前缀
pub fn strip_url_prefixes(text: &str) -> String {
    let text = URL_WITH_SCHEME.replace_all(text, "$1");
    BARE_WWW.replace_all(&text, "$1").into_owned()
}

/// `user.name@example.com` → `user dot name at example dot com`
pub fn speak_emails(text: &str) -> String {
    EMAIL
        .replace_all(text, |caps: &Captures| {
            format!(
                "{} at {}",
                caps[1].replace('.', " dot "),
                caps[2].replace('.', " dot ")
            )
        })
        .into_owned()
}

/// 电话号码的分隔符替换为空格，让后端逐组朗读
pub fn space_phone_numbers(text: &str) -> String {
    PHONE
        .replace_all(text, |caps: &Captures| {
            caps[0]
                .chars()
                .map(|c| if matches!(c, '-' | '.' | '(' | ')') { ' ' } else { c })
                .collect::<String>()
        })
        .into_owned()
}

pub fn expand_abbreviations(text: &str) -> String {
    ABBREVIATIONS
        .iter()
        .fold(text.to_string(), |acc, (re, word)| {
            re.replace_all(&acc, *word).into_owned()
        })
}

pub fn expand_symbol_table(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match SYMBOLS.iter().find(|(symbol, _)| *symbol == ch) {
            Some((_, word)) => {
                out.push(' ');
                out.push_str(word);
                out.push(' ');
            }
            None => out.push(ch),
        }
    }
    out
}

/// 完整的符号展开阶段
pub fn expand_symbols(text: &str, abbreviations: bool) -> String {
    let text = strip_url_prefixes(text);
    let text = speak_emails(&text);
    let text = space_phone_numbers(&text);
    let text = if abbreviations {
        expand_abbreviations(&text)
    } else {
        text
    };
    normalize_whitespace(&expand_symbol_table(&text))
}

/// 受限后端允许的标点
#[inline]
fn is_allowed_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '.' | ',' | '!' | '?' | ';' | ':' | '\'' | '"' | '-' | '(' | ')' | '。' | '，' | '！' | '？'
    )
}

/// 把允许列表之外的字符替换为空格
pub fn strip_special_chars(text: &str) -> String {
    let stripped: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() || is_allowed_punctuation(c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    normalize_whitespace(&stripped)
}
