// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The chatsaver authors

//! Transcript data model and JSON loading.
//!
//! A transcript is what the page extractor captures from a Copilot chat
//! session: a title, a capture timestamp, the page URL, and the ordered list
//! of messages. The JSON form uses camelCase keys.
//!
//! # Example
//!
//! ```
//! use chatsaver::transcript::{parse_transcript, Role};
//!
//! let json = r#"{
//!     "title": "Sorting in Rust",
//!     "timestamp": "2025-01-01T00:00:00Z",
//!     "messages": [
//!         { "role": "user", "content": "How do I sort a Vec?" },
//!         { "role": "assistant", "content": "Call `sort()`." }
//!     ]
//! }"#;
//!
//! let transcript = parse_transcript(json).unwrap();
//! assert_eq!(transcript.messages.len(), 2);
//! assert_eq!(transcript.messages[1].role, Role::Assistant);
//! ```

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// Error type for transcript loading failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// The input is not valid JSON or does not match the transcript shape.
    #[snafu(display("failed to parse JSON: {source}"))]
    Json {
        /// The underlying JSON parsing error.
        source: serde_json::Error,
    },

    /// The JSON is well-formed but a required part of the transcript is
    /// missing or has the wrong type.
    #[snafu(display("malformed transcript: {detail}"))]
    MalformedTranscript {
        /// What was wrong with the transcript.
        detail: String,
    },
}

/// A captured chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTranscript {
    /// The conversation title shown in the chat UI.
    pub title: String,

    /// When the transcript was captured, as an ISO-8601 string.
    #[serde(default)]
    pub timestamp: String,

    /// The page the transcript was captured from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Messages in conversation order.
    pub messages: Vec<ChatMessage>,
}

/// One turn in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Who sent the message.
    pub role: Role,

    /// The raw extracted text. May contain fenced code of its own.
    #[serde(default)]
    pub content: String,

    /// Code blocks extracted separately from the message body.
    #[serde(default)]
    pub code_blocks: Vec<CodeBlock>,

    /// When the message was sent, as an ISO-8601 string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Position of the message in the page.
    #[serde(default)]
    pub index: usize,
}

/// The author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting.
    User,
    /// Copilot.
    Assistant,
}

impl Role {
    /// Icon shown in front of the role name in message headers.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::User => "👤",
            Self::Assistant => "🤖",
        }
    }

    /// Display name used in message headers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Copilot",
        }
    }
}

/// A code excerpt attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct CodeBlock {
    /// Language tag from the page. Empty means unknown.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub language: String,

    /// The raw code.
    #[serde(default)]
    pub code: String,
}

/// Extractors emit `null` for a missing language as often as they omit it.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses transcript JSON into a [`ChatTranscript`].
///
/// The structure is checked before deserializing so that a missing title,
/// a missing message list, or an unknown role is reported as
/// [`ParseError::MalformedTranscript`] instead of rendering a partial
/// document.
///
/// # Errors
///
/// Returns [`ParseError::Json`] if the input is not valid JSON, and
/// [`ParseError::MalformedTranscript`] if required fields are missing or
/// have the wrong type.
pub fn parse_transcript(json_str: &str) -> Result<ChatTranscript, ParseError> {
    let value: serde_json::Value = serde_json::from_str(json_str).context(JsonSnafu)?;
    validate(&value)?;
    serde_json::from_value(value).context(JsonSnafu)
}

fn validate(value: &serde_json::Value) -> Result<(), ParseError> {
    ensure!(
        value.is_object(),
        MalformedTranscriptSnafu {
            detail: "expected a JSON object at the top level",
        }
    );
    ensure!(
        value.get("title").is_some_and(serde_json::Value::is_string),
        MalformedTranscriptSnafu {
            detail: "`title` is missing or not a string",
        }
    );
    let messages = value
        .get("messages")
        .and_then(serde_json::Value::as_array)
        .context(MalformedTranscriptSnafu {
            detail: "`messages` is missing or not an array",
        })?;

    for (i, message) in messages.iter().enumerate() {
        ensure!(
            message.is_object(),
            MalformedTranscriptSnafu {
                detail: format!("message {i} is not an object"),
            }
        );
        match message.get("role").and_then(serde_json::Value::as_str) {
            Some("user" | "assistant") => {}
            Some(other) => {
                return MalformedTranscriptSnafu {
                    detail: format!("message {i} has unknown role {other:?}"),
                }
                .fail();
            }
            None => {
                return MalformedTranscriptSnafu {
                    detail: format!("message {i} has no role"),
                }
                .fail();
            }
        }
    }

    Ok(())
}
