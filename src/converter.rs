// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The chatsaver authors

//! Markdown conversion for captured transcripts.
//!
//! This module turns a [`ChatTranscript`] into a Markdown document. The
//! conversion is a pure function of the transcript, the resolved
//! [`ConversionOptions`], and the export time supplied by the caller.
//!
//! # Output Format
//!
//! - An optional `# {title}` heading with a `## Chat Information` list
//! - One `## 👤 You` or `## 🤖 Copilot` section per message
//! - Extracted code blocks as fenced blocks after the message text
//! - A `---` rule between messages
//!
//! # Example
//!
//! ```
//! use chatsaver::converter::convert_to_markdown;
//! use chatsaver::options::ConversionOptions;
//! use chatsaver::transcript::{ChatMessage, ChatTranscript, Role};
//! use chrono::Utc;
//!
//! let transcript = ChatTranscript {
//!     title: "Test".into(),
//!     timestamp: "2025-01-01T00:00:00Z".into(),
//!     url: None,
//!     messages: vec![ChatMessage {
//!         role: Role::User,
//!         content: "Hi".into(),
//!         code_blocks: vec![],
//!         timestamp: None,
//!         index: 0,
//!     }],
//! };
//!
//! let markdown = convert_to_markdown(&transcript, ConversionOptions::default(), Utc::now());
//!
//! assert!(markdown.starts_with("# Test"));
//! assert!(markdown.contains("## 👤 You"));
//! ```

use crate::language::detect_language;
use crate::options::ConversionOptions;
use crate::transcript::{ChatMessage, ChatTranscript, CodeBlock};
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use std::fmt::Write;
use std::sync::LazyLock;

/// Placed between consecutive messages.
const SEPARATOR: &str = "\n---\n\n";

/// Shown as the source when the transcript has no URL.
const DEFAULT_SOURCE: &str = "Microsoft Copilot";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const TIME_FORMAT: &str = "%H:%M:%S UTC";

/// Fenced blocks shorter than this (in characters) become inline code.
const INLINE_CODE_MAX: usize = 50;

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6}[ \t])").unwrap());
static NEWLINES_BEFORE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}(#{1,6}[ \t])").unwrap());
static NEWLINES_BEFORE_LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+([*\-+]|[0-9]+\.)[ \t]").unwrap());
static BARE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```\n([^`]+)\n```").unwrap());

/// Converts a transcript to a Markdown document.
///
/// `exported_at` is written into the metadata block as the export time;
/// pass `Utc::now()` for a live export or a fixed value for reproducible
/// output.
#[must_use]
pub fn convert_to_markdown(
    transcript: &ChatTranscript,
    opts: ConversionOptions,
    exported_at: DateTime<Utc>,
) -> String {
    tracing::debug!(
        title = %transcript.title,
        messages = transcript.messages.len(),
        "converting transcript"
    );

    let mut out = String::new();

    if opts.include_metadata {
        write_header(&mut out, transcript, exported_at);
    }

    let messages: Vec<String> = transcript
        .messages
        .iter()
        .map(|message| convert_message(message, opts))
        .collect();

    if !messages.is_empty() {
        out.push_str(&messages.join(SEPARATOR));
        out.push('\n');
    }

    out
}

fn write_header(out: &mut String, transcript: &ChatTranscript, exported_at: DateTime<Utc>) {
    let source = transcript
        .url
        .as_deref()
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_SOURCE);

    writeln!(out, "# {}\n", transcript.title).unwrap();
    writeln!(out, "## Chat Information\n").unwrap();
    writeln!(out, "- **Date**: {}", format_date(&transcript.timestamp)).unwrap();
    writeln!(out, "- **Source**: {source}").unwrap();
    writeln!(out, "- **Messages**: {}", transcript.messages.len()).unwrap();
    writeln!(out, "- **Exported**: {}\n", exported_at.format(DATE_FORMAT)).unwrap();
}

/// Renders a single message: its header line, cleaned-up text and any
/// extracted code blocks.
#[must_use]
pub fn convert_message(message: &ChatMessage, opts: ConversionOptions) -> String {
    let mut out = format!("## {} {}", message.role.icon(), message.role.label());

    if opts.include_timestamps
        && let Some(ts) = message.timestamp.as_deref()
        && !ts.is_empty()
    {
        write!(out, " _({})_", format_time(ts)).unwrap();
    }

    out.push_str("\n\n");
    out.push_str(&process_message_content(&message.content));

    if !message.code_blocks.is_empty() {
        out.push_str(&convert_code_blocks(&message.code_blocks, opts));
    }

    out
}

/// Normalizes the spacing of extracted message text.
///
/// Collapses runs of blank lines, puts a blank line before headings and
/// list items, and turns short single-line fenced blocks into inline code.
/// The result ends with exactly two newlines, and processing it again
/// leaves it unchanged.
#[must_use]
pub fn process_message_content(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let processed = EXCESS_NEWLINES.replace_all(content.trim(), "\n\n");
    let processed = HEADING_LINE.replace_all(&processed, "\n${1}");
    let processed = NEWLINES_BEFORE_HEADING.replace_all(&processed, "\n\n${1}");
    let processed = NEWLINES_BEFORE_LIST_ITEM.replace_all(&processed, "\n\n${1} ");
    let processed = BARE_FENCE.replace_all(&processed, |caps: &Captures| {
        let code = &caps[1];
        if code.chars().count() < INLINE_CODE_MAX && !code.contains('\n') {
            format!("`{}`", code.trim())
        } else {
            caps[0].to_owned()
        }
    });

    format!("{}\n\n", processed.trim())
}

/// Renders extracted code blocks as fenced Markdown.
///
/// Blank blocks are skipped. When a message has several blocks each one
/// gets a `### Code Block {n}` label, numbered by position.
#[must_use]
pub fn convert_code_blocks(blocks: &[CodeBlock], opts: ConversionOptions) -> String {
    let numbered = blocks.len() > 1;
    let mut out = String::new();

    for (i, block) in blocks.iter().enumerate() {
        let code = block.code.trim();
        if code.is_empty() {
            continue;
        }

        out.push('\n');
        if numbered {
            writeln!(out, "### Code Block {}\n", i + 1).unwrap();
        }

        let language = match block.language.trim() {
            "" if opts.code_block_language_detection => detect_language(&block.code),
            tag => tag,
        };
        write!(out, "```{language}\n{code}\n```\n\n").unwrap();
    }

    out
}

/// Formats an ISO-8601 timestamp as a UTC date and time.
///
/// Values that do not parse are shown as-is.
fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "unknown".to_owned();
    }
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_owned(),
        |dt| dt.with_timezone(&Utc).format(DATE_FORMAT).to_string(),
    )
}

fn format_time(raw: &str) -> String {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_owned(),
        |dt| dt.with_timezone(&Utc).format(TIME_FORMAT).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Role;
    use chrono::TimeZone;

    fn exported_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
    }

    fn make_message(role: Role, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.into(),
            code_blocks: vec![],
            timestamp: None,
            index: 0,
        }
    }

    fn make_transcript(messages: Vec<ChatMessage>) -> ChatTranscript {
        ChatTranscript {
            title: "Test".into(),
            timestamp: "2025-01-01T00:00:00Z".into(),
            url: None,
            messages,
        }
    }

    fn block(language: &str, code: &str) -> CodeBlock {
        CodeBlock {
            language: language.into(),
            code: code.into(),
        }
    }

    fn convert(transcript: &ChatTranscript, opts: ConversionOptions) -> String {
        convert_to_markdown(transcript, opts, exported_at())
    }

    #[test]
    fn renders_single_message_transcript() {
        let transcript = make_transcript(vec![make_message(Role::User, "Hi")]);
        let output = convert(&transcript, ConversionOptions::default());

        assert!(output.starts_with("# Test"));
        assert!(output.contains("## 👤 You"));
        assert!(!output.contains("---"));
    }

    #[test]
    fn renders_exact_document() {
        let transcript = make_transcript(vec![make_message(Role::User, "Hi")]);
        let output = convert(&transcript, ConversionOptions::default());

        assert_eq!(
            output,
            "# Test\n\n\
             ## Chat Information\n\n\
             - **Date**: 2025-01-01 00:00:00 UTC\n\
             - **Source**: Microsoft Copilot\n\
             - **Messages**: 1\n\
             - **Exported**: 2025-01-02 03:04:05 UTC\n\n\
             ## 👤 You\n\n\
             Hi\n\n\n"
        );
    }

    #[test]
    fn uses_url_as_source() {
        let mut transcript = make_transcript(vec![]);
        transcript.url = Some("https://copilot.microsoft.com/chats/abc".into());
        let output = convert(&transcript, ConversionOptions::default());

        assert!(output.contains("- **Source**: https://copilot.microsoft.com/chats/abc\n"));
    }

    #[test]
    fn empty_url_falls_back_to_default_source() {
        let mut transcript = make_transcript(vec![]);
        transcript.url = Some(String::new());
        let output = convert(&transcript, ConversionOptions::default());

        assert!(output.contains("- **Source**: Microsoft Copilot\n"));
    }

    #[test]
    fn shows_unparsable_date_verbatim() {
        let mut transcript = make_transcript(vec![]);
        transcript.timestamp = "yesterday".into();
        let output = convert(&transcript, ConversionOptions::default());

        assert!(output.contains("- **Date**: yesterday\n"));
    }

    #[test]
    fn omits_header_without_metadata() {
        let transcript = make_transcript(vec![make_message(Role::Assistant, "Hello")]);
        let opts = ConversionOptions {
            include_metadata: false,
            ..Default::default()
        };
        let output = convert(&transcript, opts);

        assert!(output.starts_with("## 🤖 Copilot\n\n"));
        assert!(!output.contains("Chat Information"));
        assert!(!output.contains("# Test"));
    }

    #[test]
    fn empty_transcript_renders_header_only() {
        let output = convert(&make_transcript(vec![]), ConversionOptions::default());

        assert!(output.ends_with("- **Exported**: 2025-01-02 03:04:05 UTC\n\n"));
        assert!(output.contains("- **Messages**: 0\n"));
    }

    #[test]
    fn separates_messages_without_trailing_separator() {
        let transcript = make_transcript(vec![
            make_message(Role::User, "First question"),
            make_message(Role::Assistant, "First answer"),
            make_message(Role::User, "Second question"),
        ]);
        let output = convert(&transcript, ConversionOptions::default());

        assert_eq!(output.matches("## 👤 You").count(), 2);
        assert_eq!(output.matches("## 🤖 Copilot").count(), 1);
        assert_eq!(output.matches("\n---\n").count(), 2);
        assert!(output.ends_with("Second question\n\n\n"));
    }

    #[test]
    fn preserves_message_order() {
        let transcript = make_transcript(vec![
            make_message(Role::User, "alpha"),
            make_message(Role::Assistant, "beta"),
            make_message(Role::User, "gamma"),
        ]);
        let output = convert(&transcript, ConversionOptions::default());

        let alpha = output.find("alpha").unwrap();
        let beta = output.find("beta").unwrap();
        let gamma = output.find("gamma").unwrap();
        assert!(alpha < beta && beta < gamma);
    }

    #[test]
    fn includes_message_time_when_enabled() {
        let mut message = make_message(Role::User, "Hi");
        message.timestamp = Some("2025-01-01T13:45:10+02:00".into());
        let output = convert_message(&message, ConversionOptions::default());

        assert!(output.starts_with("## 👤 You _(11:45:10 UTC)_\n\n"));
    }

    #[test]
    fn hides_message_time_when_disabled() {
        let mut message = make_message(Role::User, "Hi");
        message.timestamp = Some("2025-01-01T13:45:10Z".into());
        let opts = ConversionOptions {
            include_timestamps: false,
            ..Default::default()
        };
        let output = convert_message(&message, opts);

        assert!(output.starts_with("## 👤 You\n\n"));
    }

    #[test]
    fn skips_time_for_messages_without_timestamp() {
        let output = convert_message(
            &make_message(Role::Assistant, "Hi"),
            ConversionOptions::default(),
        );
        assert!(output.starts_with("## 🤖 Copilot\n\n"));
    }

    #[test]
    fn renders_single_code_block_without_label() {
        let mut message = make_message(Role::Assistant, "Here:");
        message.code_blocks = vec![block("rust", "  fn main() {}\n")];
        let output = convert_message(&message, ConversionOptions::default());

        assert_eq!(
            output,
            "## 🤖 Copilot\n\nHere:\n\n\n```rust\nfn main() {}\n```\n\n"
        );
    }

    #[test]
    fn labels_multiple_code_blocks() {
        let blocks = vec![block("python", "print(1)"), block("", "   "), block("bash", "ls")];
        let output = convert_code_blocks(&blocks, ConversionOptions::default());

        assert!(output.contains("### Code Block 1\n\n```python\nprint(1)\n```"));
        assert!(!output.contains("### Code Block 2"));
        assert!(output.contains("### Code Block 3\n\n```bash\nls\n```"));
    }

    #[test]
    fn detects_language_for_untagged_blocks() {
        let blocks = vec![block("", "def f():\n    return 1")];
        let output = convert_code_blocks(&blocks, ConversionOptions::default());

        assert!(output.contains("```python\ndef f():\n    return 1\n```"));
    }

    #[test]
    fn leaves_untagged_blocks_bare_without_detection() {
        let blocks = vec![block("", "def f():\n    return 1")];
        let opts = ConversionOptions {
            code_block_language_detection: false,
            ..Default::default()
        };
        let output = convert_code_blocks(&blocks, opts);

        assert!(output.contains("```\ndef f():"));
    }

    #[test]
    fn block_language_wins_over_detection() {
        let blocks = vec![block("ruby", "def f()\n  1\nend")];
        let output = convert_code_blocks(&blocks, ConversionOptions::default());

        assert!(output.contains("```ruby\n"));
    }

    #[test]
    fn empty_content_produces_nothing() {
        assert_eq!(process_message_content(""), "");
    }

    #[test]
    fn collapses_blank_line_runs() {
        assert_eq!(process_message_content("a\n\n\n\n\nb"), "a\n\nb\n\n");
    }

    #[test]
    fn trims_and_terminates_content() {
        assert_eq!(process_message_content("  \n hello \n\n "), "hello\n\n");
    }

    #[test]
    fn puts_blank_line_before_headings() {
        assert_eq!(
            process_message_content("Intro\n## Details\nBody"),
            "Intro\n\n## Details\nBody\n\n"
        );
        assert_eq!(
            process_message_content("Intro\n\n\n### Deep"),
            "Intro\n\n### Deep\n\n"
        );
    }

    #[test]
    fn leading_heading_is_not_indented() {
        assert_eq!(process_message_content("# Title\ntext"), "# Title\ntext\n\n");
    }

    #[test]
    fn puts_blank_line_before_list_items() {
        assert_eq!(
            process_message_content("Steps:\n1. one\n2. two\n- dash\n* star\n+ plus"),
            "Steps:\n\n1. one\n\n2. two\n\n- dash\n\n* star\n\n+ plus\n\n"
        );
    }

    #[test]
    fn keeps_existing_blank_line_before_list_items() {
        assert_eq!(
            process_message_content("Steps:\n\n- one"),
            "Steps:\n\n- one\n\n"
        );
    }

    #[test]
    fn inlines_short_fenced_code() {
        assert_eq!(
            process_message_content("Run this:\n```\nls -la /tmp\n```\nthen check."),
            "Run this:\n`ls -la /tmp`\nthen check.\n\n"
        );
    }

    #[test]
    fn keeps_long_fenced_code() {
        let code = "x".repeat(60);
        let content = format!("```\n{code}\n```");
        assert_eq!(process_message_content(&content), format!("{content}\n\n"));
    }

    #[test]
    fn keeps_multi_line_fenced_code() {
        let content = "```\nfirst\nsecond\n```";
        assert_eq!(process_message_content(content), format!("{content}\n\n"));
    }

    #[test]
    fn keeps_tagged_fenced_code() {
        let content = "```sh\nls\n```";
        assert_eq!(process_message_content(content), format!("{content}\n\n"));
    }

    #[test]
    fn content_processing_is_idempotent() {
        let samples = [
            "Hi",
            "Intro\n## Details\nBody\n\n\n\nMore",
            "Steps:\n1. one\n2. two\n\n- dash",
            "# Title\n- a\n- b\n### Sub\ntext",
            "Run:\n```\nls\n```\n\n\n```\n# comment\nmore\n```",
            "  padded  \n\n\n",
        ];

        for sample in samples {
            let once = process_message_content(sample);
            assert_eq!(process_message_content(&once), once, "sample: {sample:?}");
        }
    }
}
