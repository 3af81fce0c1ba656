// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The chatsaver authors

//! Best-effort language tagging for untagged code blocks.
//!
//! The heuristics are an ordered list of patterns tested against the
//! lower-cased code. The first match wins, so earlier languages take
//! precedence on ambiguous input. This is a label for syntax highlighting,
//! not a classifier.

use regex::Regex;
use std::sync::LazyLock;

/// Ordered `(language, pattern)` pairs. Patterns are written against
/// lower-cased input.
static PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (
            "python",
            r"^import\s|^from\s.*import|def\s+[a-z0-9_]+\(|print\(|if\s+__name__\s*==",
        ),
        (
            "javascript",
            r"function\s+[a-z0-9_]+\(|const\s+[a-z0-9_]+\s*=|let\s+[a-z0-9_]+\s*=|var\s+[a-z0-9_]+\s*=|=>",
        ),
        (
            "typescript",
            r"class\s+[a-z0-9_]+\s*\{|interface\s+[a-z0-9_]+|type\s+[a-z0-9_]+\s*=",
        ),
        ("cpp", r"#include|int\s+main\(|std::|cout\s*<<"),
        ("java", r"public\s+class|import\s+java\.|system\.out\.print"),
        ("html", r"<div|<html|<head|<body|<script"),
        ("css", r"\.container\s*\{|@media|display:\s*flex"),
        ("sql", r"select\s+.*from|insert\s+into|update\s+.*set"),
        ("bash", r"^#!/bin/bash|^#!/bin/sh|\$\(.*\)|sudo\s+"),
        ("json", r#"\{[\s\n]*".*":|"[^"]*":\s*[{\[]"#),
    ]
    .into_iter()
    .map(|(lang, pattern)| (lang, Regex::new(pattern).unwrap()))
    .collect()
});

/// Guesses the language of a code snippet.
///
/// Returns the language tag to put after the opening fence, or an empty
/// string when no heuristic matches.
///
/// # Example
///
/// ```
/// use chatsaver::language::detect_language;
///
/// assert_eq!(detect_language("def f():\n    return 1"), "python");
/// assert_eq!(detect_language("Just some words."), "");
/// ```
#[must_use]
pub fn detect_language(code: &str) -> &'static str {
    let content = code.trim().to_lowercase();

    let language = PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(&content))
        .map_or("", |(lang, _)| *lang);

    tracing::trace!(language, "detected code block language");
    language
}
