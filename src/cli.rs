//! CLI definitions for cdxj-indexer
//!
//! This module contains the clap CLI structure definitions, separated from main.rs
//! so they can be accessed by xtask for documentation generation (man pages, markdown).

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::OnceLock;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgGroup, Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use crate::config::IndexerOptions;
use crate::output::OutputFormat;

/// Build clap styles for consistent CLI appearance.
///
/// - Green: headers, usage, command names
/// - White: descriptions, placeholders (renders as light gray on dark terminals)
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

/// Version string; dev builds carry the short git commit.
pub fn version() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| match option_env!("VERGEN_GIT_SHA") {
        Some(sha) if !sha.is_empty() && sha != "unknown" => {
            let short: String = sha.chars().take(7).collect();
            format!("{} ({})", env!("CARGO_PKG_VERSION"), short)
        }
        _ => env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Parser)]
#[command(name = "cdxj-indexer")]
#[command(about = "Build CDXJ / CDX lookup indexes for WARC web archives")]
#[command(
    long_about = "cdxj-indexer - Build lookup indexes for WARC web archives.

Reads WARC and ARC files (plain or gzip-compressed), directories of them, or
standard input, and writes one index line per captured record. The default
output is CDXJ; legacy 11- and 9-column CDX are also supported.

QUICK START:
    cdxj-indexer index crawl.warc.gz             Index to stdout
    cdxj-indexer index -s -o index.cdxj crawls/  Sorted index of a directory
    cdxj-indexer index -c index crawl.warc.gz    Block-compressed index"
)]
#[command(version = version())]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index WARC and ARC files
    #[command(long_about = "Index WARC and ARC files into CDXJ or legacy CDX lines.

Each input may be an archive file, a directory (searched recursively for
.warc, .warc.gz, .arc and .arc.gz files) or - for standard input.

EXAMPLES:
    cdxj-indexer index a.warc.gz b.warc.gz          CDXJ on stdout
    cdxj-indexer index -11 a.warc.gz                CDX 11-column format
    cdxj-indexer index -f referrer,method a.warc    Extra fields
    cdxj-indexer index -p a.warc.gz                 Append POST bodies to keys
    cdxj-indexer index -s -c out/index crawls/      Sorted, block-compressed")]
    Index(IndexArgs),

    /// Generate shell completions
    #[command(long_about = "Generate shell completion scripts.

EXAMPLES:
    cdxj-indexer completions bash > /etc/bash_completion.d/cdxj-indexer
    cdxj-indexer completions zsh > ~/.zfunc/_cdxj-indexer")]
    Completions {
        /// Shell to generate completions for
        shell: CompletionShell,
    },
}

/// Options of the `index` command.
///
/// Flags left unset fall back to the options file.
#[derive(Args, Debug, Default)]
#[command(group(ArgGroup::new("layout").args(["cdx09", "cdx11", "fields", "replace_fields"])))]
pub struct IndexArgs {
    /// WARC/ARC files, directories, or - for standard input
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Write the index here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Legacy CDX 9-column format
    #[arg(short = '9', long)]
    pub cdx09: bool,

    /// Legacy CDX 11-column format (also accepted as -11)
    #[arg(long)]
    pub cdx11: bool,

    /// Fields to add to the default field list (comma-separated)
    #[arg(short, long, value_name = "LIST")]
    pub fields: Option<String>,

    /// Fields to use instead of the default field list (comma-separated)
    #[arg(long, visible_alias = "rf", value_name = "LIST")]
    pub replace_fields: Option<String>,

    /// Record types to index (comma-separated), or "all"
    #[arg(long, value_name = "LIST")]
    pub records: Option<String>,

    /// Append decoded POST/PUT request bodies to lookup keys
    #[arg(short, long)]
    pub post_append: bool,

    /// Sort the index and drop duplicate lines
    #[arg(short, long)]
    pub sort: bool,

    /// Write block-compressed index data to PATH (index of blocks goes to --output)
    #[arg(short, long, value_name = "PATH")]
    pub compress: Option<PathBuf>,

    /// Index lines per compressed block
    #[arg(short, long, value_name = "N")]
    pub lines: Option<usize>,

    /// Filename recorded in every entry
    #[arg(long, value_name = "NAME")]
    pub filename: Option<String>,

    /// Record input filenames relative to DIR
    #[arg(long, value_name = "DIR")]
    pub dir_root: Option<PathBuf>,

    /// Options file (default: ~/.config/cdxj-indexer/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl IndexArgs {
    /// Layer the flags over options loaded from a file.
    pub fn apply_to(&self, mut options: IndexerOptions) -> IndexerOptions {
        if self.cdx09 {
            options.format = OutputFormat::Cdx09;
        } else if self.cdx11 {
            options.format = OutputFormat::Cdx11;
        }
        if self.fields.is_some() || self.replace_fields.is_some() {
            options.fields = self.fields.clone();
            options.replace_fields = self.replace_fields.clone();
        }
        if self.records.is_some() {
            options.records = self.records.clone();
        }
        options.post_append |= self.post_append;
        options.sort |= self.sort;
        if self.compress.is_some() {
            options.compress = self.compress.clone();
        }
        if let Some(lines) = self.lines {
            options.lines = lines;
        }
        if self.filename.is_some() {
            options.filename = self.filename.clone();
        }
        if self.dir_root.is_some() {
            options.dir_root = self.dir_root.clone();
        }
        options
    }
}

/// Rewrite the multi-character short flags `-11` and `-rf` to their long
/// forms, which clap cannot express. Arguments after `--` are left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            match arg.to_str() {
                Some("--") => {
                    passthrough = true;
                    arg
                }
                Some("-11") => OsString::from("--cdx11"),
                Some("-rf") => OsString::from("--replace-fields"),
                _ => arg,
            }
        })
        .collect()
}
