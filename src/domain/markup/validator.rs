//! SSML 校验器
//!
//! 平面扫描：用正则找出所有标签，再用一个栈检查嵌套。
//! 不构建 DOM，也不追求完整 XML 合规

use once_cell::sync::Lazy;
use regex::Regex;

use super::capabilities::MarkupCapabilities;
use super::issues::{IssueKind, Severity, ValidationIssue, ValidationReport};
use crate::domain::voice::Platform;

const ROOT_TAG: &str = "speak";

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9:_.\-]*)([^<>]*?)(/?)>").expect("valid tag regex")
});

/// 注释 / 处理指令 / DOCTYPE：跳过，不参与嵌套检查
static IGNORABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<\?.*?\?>|<![^<>]*>").expect("valid ignorable regex")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][A-Za-z0-9:_.\-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});

static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?%$").expect("valid percent regex"));
static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid number regex"));
static PITCH_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?(Hz|st)$").expect("valid pitch regex"));
static DECIBEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?dB$").expect("valid decibel regex"));
static DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?(ms|s)$").expect("valid duration regex"));

/// 扫描得到的一个标签
#[derive(Debug, Clone)]
struct Tag<'a> {
    start: usize,
    end: usize,
    name: String,
    closing: bool,
    self_closing: bool,
    attributes: &'a str,
}

fn ignorable_spans(markup: &str) -> Vec<(usize, usize)> {
    IGNORABLE
        .find_iter(markup)
        .map(|m| (m.start(), m.end()))
        .collect()
}

fn in_spans(spans: &[(usize, usize)], pos: usize) -> bool {
    spans.iter().any(|&(s, e)| pos >= s && pos < e)
}

fn scan_tags<'a>(markup: &'a str, ignorable: &[(usize, usize)]) -> Vec<Tag<'a>> {
    TAG.captures_iter(markup)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if in_spans(ignorable, whole.start()) {
                return None;
            }
            Some(Tag {
                start: whole.start(),
                end: whole.end(),
                name: caps.get(2)?.as_str().to_ascii_lowercase(),
                closing: !caps.get(1)?.as_str().is_empty(),
                self_closing: !caps.get(4)?.as_str().is_empty(),
                attributes: caps.get(3).map_or("", |m| m.as_str()),
            })
        })
        .collect()
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps.get(2).or_else(|| caps.get(3))?.as_str().trim().to_string();
            Some((name, value))
        })
        .collect()
}

fn is_valid_rate(v: &str) -> bool {
    matches!(v, "x-slow" | "slow" | "medium" | "fast" | "x-fast" | "default")
        || PERCENT.is_match(v)
        || NUMBER.is_match(v)
}

fn is_valid_pitch(v: &str) -> bool {
    matches!(v, "x-low" | "low" | "medium" | "high" | "x-high" | "default")
        || PERCENT.is_match(v)
        || PITCH_UNIT.is_match(v)
        || NUMBER.is_match(v)
}

fn is_valid_volume(v: &str) -> bool {
    matches!(
        v,
        "silent" | "x-soft" | "soft" | "medium" | "loud" | "x-loud" | "default"
    ) || DECIBEL.is_match(v)
        || PERCENT.is_match(v)
        || NUMBER.is_match(v)
}

fn is_valid_break_strength(v: &str) -> bool {
    matches!(
        v,
        "none" | "x-weak" | "weak" | "medium" | "strong" | "x-strong"
    )
}

fn is_valid_emphasis_level(v: &str) -> bool {
    matches!(v, "strong" | "moderate" | "none" | "reduced")
}

/// 属性值语法；未知组合一律放行
fn attribute_is_valid(tag: &str, attribute: &str, value: &str) -> bool {
    match (tag, attribute) {
        ("prosody", "rate") => is_valid_rate(value),
        ("prosody", "pitch") => is_valid_pitch(value),
        ("prosody", "volume") => is_valid_volume(value),
        ("break", "time") => DURATION.is_match(value),
        ("break", "strength") => is_valid_break_strength(value),
        ("emphasis", "level") => is_valid_emphasis_level(value),
        _ => true,
    }
}

/// SSML 校验器
#[derive(Debug, Clone, Default)]
pub struct MarkupValidator {
    capabilities: MarkupCapabilities,
}

impl MarkupValidator {
    pub fn new(capabilities: MarkupCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> &MarkupCapabilities {
        &self.capabilities
    }

    /// 校验标记
    ///
    /// `strict` 为 true 时，平台不支持的标签记为 error，否则记为 warning
    pub fn validate(&self, markup: &str, platform: Platform, strict: bool) -> ValidationReport {
        let ignorable = ignorable_spans(markup);
        let tags = scan_tags(markup, &ignorable);
        let mut issues = Vec::new();

        self.check_stray_brackets(markup, &tags, &ignorable, &mut issues);
        self.check_nesting(&tags, &mut issues);
        self.check_root(markup, &tags, &ignorable, &mut issues);

        for tag in tags.iter().filter(|t| !t.closing) {
            self.check_tag(tag, platform, strict, &mut issues);
        }

        issues.sort_by_key(|i| i.position);

        let report = ValidationReport { issues };
        tracing::debug!(
            platform = %platform,
            strict = strict,
            issues = report.issues.len(),
            valid = report.is_valid(),
            "Markup validated"
        );
        report
    }

    /// 删除平台不支持的标签（保留其中文本）
    ///
    /// 逆序删除，保证前面的偏移不失效
    pub fn sanitize(&self, markup: &str, platform: Platform) -> String {
        let ignorable = ignorable_spans(markup);
        let tags = scan_tags(markup, &ignorable);
        let mut out = markup.to_string();
        let mut removed = 0usize;

        for tag in tags.iter().rev() {
            if !self.capabilities.supports(platform, &tag.name) {
                out.replace_range(tag.start..tag.end, "");
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(
                platform = %platform,
                removed = removed,
                "Unsupported markup tags removed"
            );
        }
        out
    }

    /// 未被任何标签 / 注释覆盖的 `<` 视为未闭合标签
    fn check_stray_brackets(
        &self,
        markup: &str,
        tags: &[Tag<'_>],
        ignorable: &[(usize, usize)],
        issues: &mut Vec<ValidationIssue>,
    ) {
        for (pos, _) in markup.match_indices('<') {
            let covered = in_spans(ignorable, pos) || tags.iter().any(|t| t.start == pos);
            if !covered {
                issues.push(ValidationIssue::error(
                    IssueKind::MalformedMarkup,
                    "unterminated or stray '<'",
                    pos,
                ));
            }
        }
    }

    fn check_nesting(&self, tags: &[Tag<'_>], issues: &mut Vec<ValidationIssue>) {
        let mut stack: Vec<&Tag<'_>> = Vec::new();

        for tag in tags {
            if tag.self_closing {
                continue;
            }
            if !tag.closing {
                stack.push(tag);
                continue;
            }

            match stack.iter().rposition(|open| open.name == tag.name) {
                Some(index) => {
                    for open in stack.drain(index..).skip(1).rev() {
                        issues.push(
                            ValidationIssue::error(
                                IssueKind::MalformedMarkup,
                                format!("<{}> is not closed before </{}>", open.name, tag.name),
                                open.start,
                            )
                            .with_tag(open.name.clone()),
                        );
                    }
                }
                None => issues.push(
                    ValidationIssue::error(
                        IssueKind::MalformedMarkup,
                        format!("unexpected closing tag </{}>", tag.name),
                        tag.start,
                    )
                    .with_tag(tag.name.clone()),
                ),
            }
        }

        for open in stack {
            issues.push(
                ValidationIssue::error(
                    IssueKind::MalformedMarkup,
                    format!("<{}> is never closed", open.name),
                    open.start,
                )
                .with_tag(open.name.clone()),
            );
        }
    }

    fn check_root(
        &self,
        markup: &str,
        tags: &[Tag<'_>],
        ignorable: &[(usize, usize)],
        issues: &mut Vec<ValidationIssue>,
    ) {
        let Some(first) = tags.first() else {
            issues.push(ValidationIssue::error(
                IssueKind::MissingRootElement,
                "markup has no <speak> root element",
                0,
            ));
            return;
        };

        if first.name != ROOT_TAG || first.closing {
            issues.push(
                ValidationIssue::error(
                    IssueKind::MissingRootElement,
                    format!("root element must be <speak>, found <{}>", first.name),
                    first.start,
                )
                .with_tag(first.name.clone()),
            );
        }

        // 顶层元素和顶层文本
        let mut depth = 0usize;
        let mut top_level = 0usize;
        let mut cursor = 0usize;
        let mut stray_text_at = None;

        for tag in tags {
            if depth == 0 && stray_text_at.is_none() {
                stray_text_at = non_blank_text(markup, cursor, tag.start, ignorable);
            }
            let enclosed = depth > 0;

            if tag.closing {
                depth = depth.saturating_sub(1);
            } else {
                if depth == 0 {
                    top_level += 1;
                    if top_level == 2 {
                        issues.push(
                            ValidationIssue::error(
                                IssueKind::InvalidStructure,
                                "markup has more than one top-level element",
                                tag.start,
                            )
                            .with_tag(tag.name.clone()),
                        );
                    }
                }
                if !tag.self_closing {
                    depth += 1;
                }
            }

            if tag.name == ROOT_TAG && !tag.closing && enclosed {
                issues.push(
                    ValidationIssue::error(
                        IssueKind::InvalidStructure,
                        "nested <speak> element",
                        tag.start,
                    )
                    .with_tag(ROOT_TAG),
                );
            }

            cursor = tag.end;
        }

        if depth == 0 && stray_text_at.is_none() {
            stray_text_at = non_blank_text(markup, cursor, markup.len(), ignorable);
        }

        if let Some(pos) = stray_text_at {
            issues.push(ValidationIssue::warning(
                IssueKind::InvalidStructure,
                "text outside the root element",
                pos,
            ));
        }
    }

    fn check_tag(
        &self,
        tag: &Tag<'_>,
        platform: Platform,
        strict: bool,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if !self.capabilities.supports(platform, &tag.name) {
            let severity = if strict {
                Severity::Error
            } else {
                Severity::Warning
            };
            issues.push(
                ValidationIssue::new(
                    IssueKind::UnsupportedTag,
                    severity,
                    format!("<{}> is not supported on {}", tag.name, platform),
                    tag.start,
                )
                .with_tag(tag.name.clone()),
            );
            return;
        }

        if self.capabilities.is_unreliable(platform, &tag.name) {
            issues.push(
                ValidationIssue::warning(
                    IssueKind::PlatformLimitation,
                    format!("<{}> may be ignored on {}", tag.name, platform),
                    tag.start,
                )
                .with_tag(tag.name.clone()),
            );
        }

        for (attribute, value) in parse_attributes(tag.attributes) {
            if !attribute_is_valid(&tag.name, &attribute, &value) {
                issues.push(
                    ValidationIssue::warning(
                        IssueKind::InvalidAttribute,
                        format!("invalid value '{}' for {}.{}", value, tag.name, attribute),
                        tag.start,
                    )
                    .with_tag(tag.name.clone())
                    .with_attribute(attribute),
                );
            }
        }
    }
}

/// `[from, to)` 中第一个非空白且不在注释内的字符位置
fn non_blank_text(
    markup: &str,
    from: usize,
    to: usize,
    ignorable: &[(usize, usize)],
) -> Option<usize> {
    markup
        .get(from..to)?
        .char_indices()
        .map(|(i, c)| (from + i, c))
        .find(|&(pos, c)| !c.is_whitespace() && !in_spans(ignorable, pos))
        .map(|(pos, _)| pos)
}

/// 去掉所有标签，只留文本
pub fn strip_tags(markup: &str) -> String {
    let without_comments = IGNORABLE.replace_all(markup, " ");
    let without_tags = TAG.replace_all(&without_comments, " ");
    let unescaped = without_tags
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    unescaped.split_whitespace().collect::<Vec<_>>().join(" ")
}
