// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The chatsaver authors

//! Minimal HTML preview of converted Markdown.
//!
//! This is not a Markdown implementation. It covers the constructs the
//! converter itself emits (headings up to `###`, rules, fenced code, inline
//! code, bold and italics) well enough to eyeball an export in a browser.

use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]+`").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_(.+?)_\b").unwrap());

/// Renders Markdown as an HTML fragment.
///
/// # Example
///
/// ```
/// use chatsaver::preview::markdown_to_html;
///
/// let html = markdown_to_html("## 🤖 Copilot\n\nUse `cargo` **today**.");
/// assert!(html.contains("<h2>🤖 Copilot</h2>"));
/// assert!(html.contains("<code>cargo</code>"));
/// assert!(html.contains("<strong>today</strong>"));
/// ```
#[must_use]
pub fn markdown_to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 2);
    let mut in_fence = false;

    for line in markdown.lines() {
        if let Some(info) = line.strip_prefix("```") {
            if in_fence {
                out.push_str("</code></pre>\n");
            } else {
                match info.trim() {
                    "" => out.push_str("<pre><code>"),
                    lang => write!(out, "<pre><code class=\"language-{}\">", escape_html(lang))
                        .unwrap(),
                }
            }
            in_fence = !in_fence;
            continue;
        }

        if in_fence {
            writeln!(out, "{}", escape_html(line)).unwrap();
        } else {
            writeln!(out, "{}", render_line(line)).unwrap();
        }
    }

    if in_fence {
        out.push_str("</code></pre>\n");
    }

    out
}

/// Wraps [`markdown_to_html`] output in a standalone HTML page.
#[must_use]
pub fn html_document(title: &str, markdown: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        markdown_to_html(markdown)
    )
}

fn render_line(line: &str) -> String {
    if line.trim().is_empty() {
        return "<br>".to_owned();
    }
    if line.trim() == "---" {
        return "<hr>".to_owned();
    }

    let level = line.chars().take_while(|&c| c == '#').count();
    if (1..=3).contains(&level)
        && let Some(text) = line[level..].strip_prefix(' ')
    {
        return format!("<h{level}>{}</h{level}>", render_inline(text.trim()));
    }

    format!("{}<br>", render_inline(line))
}

/// Escapes the line, then applies inline formatting outside code spans.
fn render_inline(text: &str) -> String {
    let escaped = escape_html(text);
    let mut out = String::with_capacity(escaped.len());
    let mut last = 0;

    for span in INLINE_CODE.find_iter(&escaped) {
        out.push_str(&emphasis(&escaped[last..span.start()]));
        write!(out, "<code>{}</code>", &escaped[span.start() + 1..span.end() - 1]).unwrap();
        last = span.end();
    }
    out.push_str(&emphasis(&escaped[last..]));

    out
}

fn emphasis(text: &str) -> String {
    let text = BOLD.replace_all(text, "<strong>${1}</strong>");
    let text = ITALIC_STAR.replace_all(&text, "<em>${1}</em>");
    ITALIC_UNDERSCORE
        .replace_all(&text, "<em>${1}</em>")
        .into_owned()
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}
