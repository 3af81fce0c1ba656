// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The chatsaver authors

//! Convert captured Microsoft Copilot chat transcripts to Markdown.
//!
//! A transcript is the structured capture of a Copilot web chat: its title,
//! when it was captured, where from, and the ordered messages with any code
//! blocks pulled out of them. This crate turns that capture into a readable
//! Markdown document.
//!
//! # Overview
//!
//! 1. Load the transcript JSON into typed Rust values
//! 2. Resolve the conversion options
//! 3. Convert to Markdown and pick a filename for it
//!
//! # Example
//!
//! ```no_run
//! use chatsaver::{converter, filename, options::ConversionOptions, transcript};
//! use chrono::Utc;
//!
//! let json = std::fs::read_to_string("chat.json").unwrap();
//! let chat = transcript::parse_transcript(&json).unwrap();
//!
//! let opts = ConversionOptions {
//!     include_timestamps: false,
//!     ..Default::default()
//! };
//!
//! let now = Utc::now();
//! let markdown = converter::convert_to_markdown(&chat, opts, now);
//! let name = filename::generate_filename(&chat.title, now.date_naive());
//! std::fs::write(name, markdown).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`transcript`]: transcript types and JSON loading
//! - [`options`]: conversion options and partial overrides
//! - [`converter`]: Markdown generation
//! - [`language`]: language tagging for untagged code blocks
//! - [`filename`]: output filename generation and sanitizing
//! - [`preview`]: HTML preview of converted Markdown

#![deny(missing_docs)]

pub mod converter;
pub mod filename;
pub mod language;
pub mod options;
pub mod preview;
pub mod transcript;
