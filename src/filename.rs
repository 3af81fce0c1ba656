// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The chatsaver authors

//! Output filename generation.
//!
//! Default names look like `copilot-chat-{title}-{YYYY-MM-DD}.md`. Names
//! typed by a user go through [`resolve_filename`] instead.
//!
//! # Example
//!
//! ```
//! use chatsaver::filename::{generate_filename, sanitize_filename};
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! assert_eq!(
//!     generate_filename("Rust: borrow checker?", date),
//!     "copilot-chat-rust-borrow-checker-2025-01-01.md"
//! );
//! assert_eq!(sanitize_filename("notes: a/b"), "notes- a-b");
//! ```

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Used when a user-supplied name is empty.
pub const FALLBACK_NAME: &str = "copilot-chat-export";

/// Maximum length of the title segment in generated names.
const MAX_TITLE_LEN: usize = 50;

static NON_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s-]").unwrap());
static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RESERVED_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Builds the default filename for a transcript.
///
/// The title is reduced to ASCII letters, digits and hyphens, lower-cased
/// and cut to 50 characters. `date` is normally today's date.
#[must_use]
pub fn generate_filename(title: &str, date: NaiveDate) -> String {
    let stripped = NON_NAME_CHARS.replace_all(title, "");
    let hyphenated = WHITESPACE_RUNS.replace_all(&stripped, "-");
    let slug: String = hyphenated
        .to_lowercase()
        .chars()
        .take(MAX_TITLE_LEN)
        .collect();

    format!("copilot-chat-{slug}-{}.md", date.format("%Y-%m-%d"))
}

/// Replaces characters that are not allowed in filenames.
///
/// Reserved characters become hyphens, hyphen runs are collapsed, and
/// leading or trailing hyphens are removed. Sanitizing twice gives the same
/// result as sanitizing once.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let replaced = RESERVED_CHARS.replace_all(filename, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_owned()
}

/// Turns a user-supplied name into a safe `.md` filename.
///
/// Blank names fall back to [`FALLBACK_NAME`].
#[must_use]
pub fn resolve_filename(name: &str) -> String {
    let sanitized = sanitize_filename(name.trim());
    let mut filename = if sanitized.is_empty() {
        FALLBACK_NAME.to_owned()
    } else {
        sanitized
    };
    if !filename.ends_with(".md") {
        filename.push_str(".md");
    }
    filename
}
