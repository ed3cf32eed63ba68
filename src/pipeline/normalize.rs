//! Block normalisation: restricted Markdown → ordered layout blocks.
//!
//! The legal sources use a deliberately small Markdown dialect: `#` headings,
//! `-`/`*` bullets with two-space nesting, paragraphs, blank lines and
//! horizontal rules. Inline emphasis and code markers are stripped and links
//! are rewritten to `label (url)` so both renderers can treat text as plain
//! strings.
//!
//! Every input line produces exactly one [`Block`], in source order. Lines that
//! match no rule become paragraphs; normalisation never fails.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// A typed layout block produced from one source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    /// Vertical spacing; also produced for horizontal rules.
    Blank,
    /// `#`-prefixed heading. Levels above 3 share the default size class.
    Heading { level: usize, text: String },
    /// List item; `indent` is the nesting depth (two spaces per level).
    Bullet { text: String, indent: usize },
    /// Any other non-blank line.
    Paragraph { text: String },
}

impl Block {
    /// Cleaned text carried by the block, `None` for [`Block::Blank`].
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Blank => None,
            Block::Heading { text, .. } | Block::Bullet { text, .. } | Block::Paragraph { text } => {
                Some(text)
            }
        }
    }
}

const RULE_TOKENS: [&str; 3] = ["---", "***", "___"];

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#+)\s+(.*)$").unwrap());

static RE_LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new("\r\n|[\n\r\x0B\x0C\x1C\x1D\x1E\u{85}\u{2028}\u{2029}]").unwrap());

/// Split `text` into lines and classify each one.
pub fn normalize(text: &str) -> Vec<Block> {
    split_lines(text).into_iter().map(classify_line).collect()
}

/// Split on every Unicode line boundary, including a lone `\r`, form feed and
/// U+2028. A trailing boundary does not start an extra line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = RE_LINE_BREAK.split(text).collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

fn classify_line(raw_line: &str) -> Block {
    let line = raw_line.trim_end();
    let stripped = line.trim();

    if stripped.is_empty() || RULE_TOKENS.contains(&stripped) {
        return Block::Blank;
    }

    let unindented = line.trim_start();
    if unindented.starts_with('-') || unindented.starts_with("* ") {
        let leading_spaces = line.len() - line.trim_start_matches(' ').len();
        // Both markers are a single ASCII byte.
        return Block::Bullet {
            text: clean(unindented[1..].trim()),
            indent: leading_spaces / 2,
        };
    }

    if let Some(caps) = RE_HEADING.captures(line) {
        return Block::Heading {
            level: caps[1].len(),
            text: clean(&caps[2]),
        };
    }

    Block::Paragraph { text: clean(line) }
}

// ── Inline cleanup ───────────────────────────────────────────────────────────

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Reduce inline Markdown to display text.
///
/// Rules (applied in order):
/// 1. Trim; empty input returns empty
/// 2. Strip `**bold**`, then `*italic*` (one non-greedy pass each)
/// 3. Drop backticks
/// 4. Rewrite `[label](href)` as `label (href)`, or just `href` when the two
///    are equal; a `mailto:` prefix is removed from `href` first
/// 5. Collapse whitespace runs and trim
///
/// Markers are not paired up across passes, so input such as `*a*b*` keeps a
/// stray `*`.
pub fn clean(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        return String::new();
    }

    let value = RE_BOLD.replace_all(value, "${1}");
    let value = RE_ITALIC.replace_all(&value, "${1}");
    let value = value.replace('`', "");
    let value = RE_LINK.replace_all(&value, |caps: &Captures| rewrite_link(&caps[1], &caps[2]));
    let value = RE_WHITESPACE.replace_all(&value, " ");
    value.trim().to_string()
}

fn rewrite_link(label: &str, href: &str) -> String {
    let href = href.strip_prefix("mailto:").unwrap_or(href);
    if label != href {
        format!("{label} ({href})")
    } else {
        href.to_string()
    }
}
