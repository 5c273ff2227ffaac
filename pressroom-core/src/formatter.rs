//! Normalises generated text into the markup the destination expects.
//!
//! [`format`] is pure and never fails: text without any structure still
//! yields a placeholder title and plain paragraphs. Two input shapes are
//! handled:
//! - Markdown-ish text (the usual chat completion output) is escaped and
//!   converted to headings, paragraphs, lists and inline emphasis.
//! - Text that already contains block-level HTML is kept, minus script and
//!   style blocks, and every heading is rewritten with the configured class
//!   and emphasis.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::config::FormatConfig;

/// First-line candidates longer than this are body text, not a title.
const MAX_TITLE_CHARS: usize = 200;

/// Output of [`format`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedContent {
    pub title: String,
    pub body_markup: String,
    /// Visible characters in the body, tags excluded.
    pub body_chars: usize,
}

pub fn format(raw: &str, config: &FormatConfig) -> FormattedContent {
    let text = raw.replace("\r\n", "\n");
    let (title, rest) = split_title(&text);
    let title = title.unwrap_or_else(|| config.title_placeholder.clone());

    let body_markup = if looks_like_html(rest) {
        rewrite_html(rest, config)
    } else {
        markdown_to_markup(rest, config)
    };
    let body_chars = visible_chars(&body_markup);

    FormattedContent {
        title,
        body_markup,
        body_chars,
    }
}

// ---------------------------------------------------------------------------
// Title
// ---------------------------------------------------------------------------

static LEADING_HTML_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^<h[1-6]\b[^>]*>(.*?)</h[1-6]\s*>").expect("valid regex"));
static MD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)(?:\s+#+)?\s*$").expect("valid regex"));
static BOLD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\*\*|__)([^*_]+?)(?:\*\*|__):?\s*$").expect("valid regex"));
static TITLE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:title|titre)\s*:\s*").expect("valid regex"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(.*)$").expect("valid regex"));
static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Splits off the title. Returns `None` when the text has nothing title-like.
fn split_title(text: &str) -> (Option<String>, &str) {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return (None, "");
    }

    if let Some(caps) = LEADING_HTML_HEADING.captures(trimmed) {
        let end = caps.get(0).map_or(0, |m| m.end());
        return (non_empty(clean_title(&caps[1])), &trimmed[end..]);
    }

    let (line, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
    if let Some(caps) = MD_HEADING.captures(line.trim()) {
        return (non_empty(clean_title(&caps[2])), rest);
    }
    let heading_like = BOLD_LINE.is_match(line)
        || TITLE_LABEL.is_match(line.trim_start_matches(['#', '*', ' ']));
    let short_paragraph =
        line.trim().chars().count() <= MAX_TITLE_CHARS && !LIST_ITEM.is_match(line);

    if heading_like || short_paragraph {
        (non_empty(clean_title(line)), rest)
    } else {
        (None, trimmed)
    }
}

fn clean_title(line: &str) -> String {
    let mut title = TAG.replace_all(line, "").trim().to_string();
    title = title.trim_start_matches('#').trim().to_string();
    for marker in ["**", "__"] {
        title = title
            .trim_start_matches(marker)
            .trim_end_matches(':')
            .trim_end_matches(marker)
            .trim()
            .to_string();
    }
    title = TITLE_LABEL.replace(&title, "").to_string();
    title
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '«' | '»') || c.is_whitespace())
        .to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

// ---------------------------------------------------------------------------
// HTML input
// ---------------------------------------------------------------------------

static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:p|h[1-6]|ul|ol|li|div|article|section|br)\b").expect("valid regex")
});
static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>").expect("valid regex")
});
static HTML_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>").expect("valid regex")
});
static STRONG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?strong\s*>").expect("valid regex"));

fn looks_like_html(text: &str) -> bool {
    BLOCK_TAG.is_match(text)
}

fn rewrite_html(text: &str, config: &FormatConfig) -> String {
    let cleaned = SCRIPT_OR_STYLE.replace_all(text, "");
    let rewritten = HTML_HEADING.replace_all(&cleaned, |caps: &Captures| {
        let level = caps[1].parse::<u8>().unwrap_or(2);
        let inner = STRONG_TAG.replace_all(caps[2].trim(), "");
        heading(level, &inner, config)
    });
    rewritten.trim().to_string()
}

// ---------------------------------------------------------------------------
// Markdown input
// ---------------------------------------------------------------------------

static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__").expect("valid regex"));
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").expect("valid regex"));

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

struct Blocks<'c> {
    config: &'c FormatConfig,
    out: Vec<String>,
    paragraph: Vec<String>,
    list: Option<(ListKind, Vec<String>)>,
}

impl<'c> Blocks<'c> {
    fn flush(&mut self) {
        if !self.paragraph.is_empty() {
            let text = self.paragraph.join(" ");
            self.paragraph.clear();
            let class = class_attr(self.config.paragraph_class.as_deref());
            self.out.push(format!("<p{class}>{}</p>", inline(&text)));
        }
        if let Some((kind, items)) = self.list.take() {
            let tag = match kind {
                ListKind::Unordered => "ul",
                ListKind::Ordered => "ol",
            };
            let items: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", inline(item)))
                .collect();
            self.out.push(format!("<{tag}>{items}</{tag}>"));
        }
    }

    fn list_item(&mut self, kind: ListKind, text: &str) {
        if !self.paragraph.is_empty() || self.list.as_ref().is_some_and(|(k, _)| *k != kind) {
            self.flush();
        }
        self.list
            .get_or_insert_with(|| (kind, Vec::new()))
            .1
            .push(text.trim().to_string());
    }
}

fn markdown_to_markup(text: &str, config: &FormatConfig) -> String {
    let mut blocks = Blocks {
        config,
        out: Vec::new(),
        paragraph: Vec::new(),
        list: None,
    };

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blocks.flush();
        } else if let Some(caps) = MD_HEADING.captures(trimmed) {
            blocks.flush();
            let level = caps[1].len() as u8;
            blocks.out.push(heading(level, &inline(&caps[2]), config));
        } else if let Some(caps) = BOLD_LINE.captures(trimmed) {
            blocks.flush();
            blocks
                .out
                .push(heading(2, &inline(caps[1].trim().trim_end_matches(':')), config));
        } else if let Some(caps) = LIST_ITEM.captures(line) {
            let kind = if ORDERED_ITEM.is_match(line) {
                ListKind::Ordered
            } else {
                ListKind::Unordered
            };
            blocks.list_item(kind, &caps[1]);
        } else {
            if blocks.list.is_some() {
                blocks.flush();
            }
            blocks.paragraph.push(trimmed.to_string());
        }
    }
    blocks.flush();

    blocks.out.join("\n")
}

/// Escapes the text, then applies strong and emphasis markers.
fn inline(text: &str) -> String {
    let escaped = escape(text);
    let strong = STRONG.replace_all(&escaped, |caps: &Captures| {
        let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("<strong>{inner}</strong>")
    });
    EMPHASIS.replace_all(&strong, "<em>$1</em>").to_string()
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

fn heading(level: u8, inner_markup: &str, config: &FormatConfig) -> String {
    let level = level.clamp(1, 6);
    let class = class_attr(config.heading_class.as_deref());
    if config.emphasize_headings {
        format!("<h{level}{class}><strong>{inner_markup}</strong></h{level}>")
    } else {
        format!("<h{level}{class}>{inner_markup}</h{level}>")
    }
}

fn class_attr(class: Option<&str>) -> String {
    match class.map(str::trim).filter(|c| !c.is_empty()) {
        Some(class) => format!(" class=\"{}\"", escape(class)),
        None => String::new(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn visible_chars(markup: &str) -> usize {
    let text = TAG.replace_all(markup, "");
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&");
    text.trim().chars().count()
}
