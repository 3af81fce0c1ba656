// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The chatsaver authors

//! Conversion options and partial overrides.
//!
//! [`ConversionOptions`] is always fully resolved before it reaches the
//! converter. Partial settings, such as those saved by the browser extension
//! or passed on the command line, are expressed as [`OptionOverrides`] and
//! applied on top of a base value key by key.
//!
//! # Example
//!
//! ```
//! use chatsaver::options::{ConversionOptions, OptionOverrides};
//!
//! let overrides = OptionOverrides::from_json(r#"{ "includeMetadata": false }"#).unwrap();
//! let opts = overrides.apply(ConversionOptions::default());
//!
//! assert!(!opts.include_metadata);
//! assert!(opts.include_timestamps);
//! ```

use serde::Deserialize;
use snafu::prelude::*;

/// Error type for settings loading failures.
#[derive(Debug, Snafu)]
pub enum SettingsError {
    /// The settings file is not valid JSON or has values of the wrong type.
    #[snafu(display("failed to parse settings: {source}"))]
    Json {
        /// The underlying JSON parsing error.
        source: serde_json::Error,
    },
}

/// Configuration options for Markdown conversion.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Whether message headers carry the time each message was sent.
    pub include_timestamps: bool,

    /// Whether the document starts with the title and a
    /// `## Chat Information` block.
    pub include_metadata: bool,

    /// Accepted for compatibility with saved settings. Code blocks are
    /// always emitted.
    pub format_code_blocks: bool,

    /// Whether untagged code blocks get a language inferred from their
    /// contents.
    pub code_block_language_detection: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            include_timestamps: true,
            include_metadata: true,
            format_code_blocks: true,
            code_block_language_detection: true,
        }
    }
}

/// A partial set of [`ConversionOptions`].
///
/// Keys that are `None` leave the base value untouched. The JSON form uses
/// the same camelCase keys the browser extension stores; unknown keys are
/// ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionOverrides {
    /// Overrides [`ConversionOptions::include_timestamps`].
    pub include_timestamps: Option<bool>,
    /// Overrides [`ConversionOptions::include_metadata`].
    pub include_metadata: Option<bool>,
    /// Overrides [`ConversionOptions::format_code_blocks`].
    pub format_code_blocks: Option<bool>,
    /// Overrides [`ConversionOptions::code_block_language_detection`].
    pub code_block_language_detection: Option<bool>,
}

impl OptionOverrides {
    /// Parses overrides from a JSON settings document.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a JSON object or a known key
    /// holds something other than a boolean.
    pub fn from_json(json_str: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json_str).context(JsonSnafu)
    }

    /// Returns `base` with every key present in `self` replaced.
    #[must_use]
    pub fn apply(self, base: ConversionOptions) -> ConversionOptions {
        ConversionOptions {
            include_timestamps: self.include_timestamps.unwrap_or(base.include_timestamps),
            include_metadata: self.include_metadata.unwrap_or(base.include_metadata),
            format_code_blocks: self.format_code_blocks.unwrap_or(base.format_code_blocks),
            code_block_language_detection: self
                .code_block_language_detection
                .unwrap_or(base.code_block_language_detection),
        }
    }

    /// Combines two override sets. Keys present in `later` win.
    #[must_use]
    pub fn merge(self, later: Self) -> Self {
        Self {
            include_timestamps: later.include_timestamps.or(self.include_timestamps),
            include_metadata: later.include_metadata.or(self.include_metadata),
            format_code_blocks: later.format_code_blocks.or(self.format_code_blocks),
            code_block_language_detection: later
                .code_block_language_detection
                .or(self.code_block_language_detection),
        }
    }
}
