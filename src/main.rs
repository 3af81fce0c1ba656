// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The chatsaver authors

//! Command-line interface for chatsaver.
//!
//! This binary provides the `chatsaver` command for converting captured
//! Copilot chat transcripts from JSON to Markdown.

use chatsaver::options::{ConversionOptions, OptionOverrides};
use chatsaver::{converter, filename, options, preview, transcript};
use chrono::{DateTime, Utc};
use lexopt::prelude::*;
use snafu::{ensure, prelude::*};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

/// Where to write the rendered output.
#[derive(Clone)]
enum OutputTarget {
    /// Write each file to the specified directory.
    Directory(PathBuf),
    /// Write to stdout.
    Stdout,
}

/// What to write for each transcript.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Markdown,
    Html,
    Json,
}

impl Format {
    const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format {other:?} (expected markdown, html or json)")),
        }
    }
}

struct Cli {
    input: Vec<PathBuf>,
    output: OutputTarget,
    format: Format,
    name: Option<String>,
    settings: Option<PathBuf>,
    overrides: OptionOverrides,
    quiet: bool,
    dry_run: bool,
    force: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("at least one input file or directory is required"))]
    NoInputFiles,

    #[snafu(display("no JSON transcripts found in the given inputs"))]
    NoTranscripts,

    #[snafu(display("cannot output multiple files to stdout"))]
    MultipleFilesToStdout,

    #[snafu(display("--name can only be used with a single input file"))]
    NameWithMultipleFiles,

    #[snafu(display("failed to read settings {}: {source}", path.display()))]
    ReadSettings {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("invalid settings in {}: {source}", path.display()))]
    ParseSettings {
        path: PathBuf,
        source: options::SettingsError,
    },

    #[snafu(display("failed to create output directory: {source}"))]
    CreateOutputDir { source: std::io::Error },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: transcript::ParseError,
    },

    #[snafu(display("failed to serialize {}: {source}", path.display()))]
    SerializeJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert captured Microsoft Copilot chat transcripts to Markdown

Usage: {name} [OPTIONS] <INPUT>...

Arguments:
  <INPUT>...  Transcript JSON files or directories containing them

Options:
  -o, --output <OUTPUT>     Output directory, or - for stdout (default: .)
  -F, --format <FORMAT>     markdown, html or json (default: markdown)
      --name <NAME>         Output file name (single input only)
  -s, --settings <FILE>     JSON file with conversion settings

Conversion (use --X or --no-X, the last one wins):
      --timestamps          Include message times (default: on)
      --metadata            Include title and chat information (default: on)
      --format-code         Format code blocks (default: on)
      --detect-language     Tag untagged code blocks (default: on)

Other options:
  -q, --quiet               Suppress progress messages
  -n, --dry-run             Show what would be written without writing
  -f, --force               Overwrite existing output files
  -h, --help                Print help
  -V, --version             Print version

Set RUST_LOG=debug for diagnostic output.",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut input = Vec::new();
    let mut output = OutputTarget::Directory(PathBuf::from("."));
    let mut format = Format::Markdown;
    let mut name = None;
    let mut settings = None;
    let mut overrides = OptionOverrides::default();
    let mut quiet = false;
    let mut dry_run = false;
    let mut force = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => {
                let val: PathBuf = parser.value()?.parse()?;
                output = if val == Path::new("-") {
                    OutputTarget::Stdout
                } else {
                    OutputTarget::Directory(val)
                };
            }
            Short('F') | Long("format") => format = parser.value()?.parse()?,
            Long("name") => name = Some(parser.value()?.string()?),
            Short('s') | Long("settings") => settings = Some(parser.value()?.parse()?),
            // Conversion flags - last one wins
            Long("timestamps") => overrides.include_timestamps = Some(true),
            Long("no-timestamps") => overrides.include_timestamps = Some(false),
            Long("metadata") => overrides.include_metadata = Some(true),
            Long("no-metadata") => overrides.include_metadata = Some(false),
            Long("format-code") => overrides.format_code_blocks = Some(true),
            Long("no-format-code") => overrides.format_code_blocks = Some(false),
            Long("detect-language") => overrides.code_block_language_detection = Some(true),
            Long("no-detect-language") => overrides.code_block_language_detection = Some(false),
            Short('q') | Long("quiet") => quiet = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('f') | Long("force") => force = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => input.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input,
        output,
        format,
        name,
        settings,
        overrides,
        quiet,
        dry_run,
        force,
    })
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Error> {
    init_tracing();

    let cli = parse_args().context(ParseArgsSnafu)?;

    ensure!(!cli.input.is_empty(), NoInputFilesSnafu);

    let opts = resolve_options(&cli)?;
    tracing::debug!(?opts, "resolved conversion options");

    let files = collect_input_files(&cli.input);
    ensure!(!files.is_empty(), NoTranscriptsSnafu);
    ensure!(
        cli.name.is_none() || files.len() == 1,
        NameWithMultipleFilesSnafu
    );

    let exported_at = Utc::now();

    match &cli.output {
        OutputTarget::Stdout => {
            ensure!(files.len() == 1, MultipleFilesToStdoutSnafu);
            process_to_stdout(&files[0], &cli, opts, exported_at)?;
        }
        OutputTarget::Directory(dir) => {
            if !cli.dry_run {
                std::fs::create_dir_all(dir).context(CreateOutputDirSnafu)?;
            }
            let mut written = HashSet::new();
            for file in &files {
                process_file(file, dir, &cli, opts, exported_at, &mut written)?;
            }
        }
    }

    Ok(())
}

/// Applies the settings file and then the command-line flags to the defaults.
fn resolve_options(cli: &Cli) -> Result<ConversionOptions, Error> {
    let from_file = match &cli.settings {
        Some(path) => {
            let json = std::fs::read_to_string(path).context(ReadSettingsSnafu { path })?;
            OptionOverrides::from_json(&json).context(ParseSettingsSnafu { path })?
        }
        None => OptionOverrides::default(),
    };

    Ok(from_file
        .merge(cli.overrides)
        .apply(ConversionOptions::default()))
}

/// Collects all JSON files from the given inputs (files and directories).
fn collect_input_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            files.push(input.clone());
        }
    }
    files
}

fn load_transcript(path: &Path) -> Result<transcript::ChatTranscript, Error> {
    tracing::debug!(path = %path.display(), "loading transcript");
    let json = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
    transcript::parse_transcript(&json).context(ParseFileSnafu { path })
}

/// Renders a transcript in the requested output format.
fn render(
    chat: &transcript::ChatTranscript,
    path: &Path,
    cli: &Cli,
    opts: ConversionOptions,
    exported_at: DateTime<Utc>,
) -> Result<String, Error> {
    Ok(match cli.format {
        Format::Markdown => converter::convert_to_markdown(chat, opts, exported_at),
        Format::Html => preview::html_document(
            &chat.title,
            &converter::convert_to_markdown(chat, opts, exported_at),
        ),
        Format::Json => {
            let mut json =
                serde_json::to_string_pretty(chat).context(SerializeJsonSnafu { path })?;
            json.push('\n');
            json
        }
    })
}

/// Picks the output filename for a transcript.
fn output_name(chat: &transcript::ChatTranscript, cli: &Cli, exported_at: DateTime<Utc>) -> PathBuf {
    let name = cli.name.as_deref().map_or_else(
        || filename::generate_filename(&chat.title, exported_at.date_naive()),
        filename::resolve_filename,
    );
    PathBuf::from(name).with_extension(cli.format.extension())
}

/// Appends `-2`, `-3`, ... to the file stem until the path was not already
/// produced by this run.
fn unique_path(path: PathBuf, written: &HashSet<PathBuf>) -> PathBuf {
    if !written.contains(&path) {
        return path;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut n = 2;
    loop {
        let candidate = path.with_file_name(format!("{stem}-{n}.{ext}"));
        if !written.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Processes a single file and outputs to stdout.
fn process_to_stdout(
    input: &Path,
    cli: &Cli,
    opts: ConversionOptions,
    exported_at: DateTime<Utc>,
) -> Result<(), Error> {
    if cli.dry_run {
        eprintln!("Would output {}", input.display());
        return Ok(());
    }

    let chat = load_transcript(input)?;
    let rendered = render(&chat, input, cli, opts, exported_at)?;

    print!("{rendered}");
    Ok(())
}

/// Processes a single file and writes to the output directory.
fn process_file(
    input: &Path,
    out_dir: &Path,
    cli: &Cli,
    opts: ConversionOptions,
    exported_at: DateTime<Utc>,
    written: &mut HashSet<PathBuf>,
) -> Result<(), Error> {
    let chat = load_transcript(input)?;
    let out_path = unique_path(out_dir.join(output_name(&chat, cli, exported_at)), written);

    // Handle dry-run mode
    if cli.dry_run {
        eprintln!("Would write {}", out_path.display());
        written.insert(out_path);
        return Ok(());
    }

    // Check if output exists and handle overwrite
    if out_path.exists() && !cli.force {
        eprintln!(
            "Skipping {} (already exists, use --force to overwrite)",
            out_path.display()
        );
        return Ok(());
    }

    let rendered = render(&chat, input, cli, opts, exported_at)?;
    std::fs::write(&out_path, &rendered).context(WriteFileSnafu { path: &out_path })?;

    if !cli.quiet {
        eprintln!("Wrote {}", out_path.display());
    }
    written.insert(out_path);
    Ok(())
}
