//! Display sanitization for mention content.
//!
//! This is deliberately narrow: `<script>` and `<iframe>` elements (with
//! their contents) are removed and nothing else is touched. It is not an
//! HTML sanitizer. Long HTML bodies are not rendered at all, which is what
//! keeps the narrow filter acceptable.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Content;

/// HTML bodies longer than this (in characters) are replaced by a link.
pub const MAX_HTML_CHARS: usize = 2000;

static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script>").expect("script pattern is valid"));

static IFRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<iframe\b.*?</iframe>").expect("iframe pattern is valid"));

/// Strip `<script>` and `<iframe>` elements, contents included.
pub fn strip_dangerous_tags(input: &str) -> String {
    let without_scripts = SCRIPT.replace_all(input, "");
    IFRAME.replace_all(&without_scripts, "").into_owned()
}

/// Stand-in shown instead of very long HTML (newsletters, link roundups).
pub fn stand_in(source: &str) -> String {
    let href = escape_attr(source);
    format!(r#"mentioned this in <a href="{href}">{href}</a>"#)
}

/// Fill `content.value` with the display form.
///
/// HTML wins over text; empty strings count as absent.
pub fn clean_content(content: &mut Content, source: &str) {
    let html = content.html.as_deref().filter(|h| !h.is_empty());
    let text = content.text.as_deref().filter(|t| !t.is_empty());

    content.value = match (html, text) {
        (Some(html), _) if html.chars().count() > MAX_HTML_CHARS => Some(stand_in(source)),
        (Some(html), _) => Some(strip_dangerous_tags(html)),
        (None, Some(text)) => Some(strip_dangerous_tags(text)),
        (None, None) => None,
    };
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
