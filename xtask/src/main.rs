//! xtask - Build tasks for cdxj-indexer
//!
//! Run with: cargo xtask <command>
//!
//! Commands:
//! - gen-docs: Generate documentation (man pages, COMMANDS.md, Configuration.md)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, Command, CommandFactory, Parser, Subcommand};

use cdxj_indexer::cli::Cli;
use cdxj_indexer::config::docs::CONFIG_FIELDS;

const BIN: &str = "cdxj-indexer";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build tasks for cdxj-indexer")]
struct Xtask {
    #[command(subcommand)]
    command: XtaskCommand,
}

#[derive(Subcommand)]
enum XtaskCommand {
    /// Generate documentation from CLI definitions
    #[command(name = "gen-docs")]
    GenDocs {
        /// Output directory (default: docs/)
        #[arg(long, short, default_value = "docs")]
        output: PathBuf,

        /// Generate man pages
        #[arg(long)]
        man: bool,

        /// Generate COMMANDS.md
        #[arg(long)]
        markdown: bool,

        /// Generate Configuration.md
        #[arg(long)]
        config: bool,
    },
}

fn main() -> Result<()> {
    let args = Xtask::parse();

    match args.command {
        XtaskCommand::GenDocs {
            output,
            man,
            markdown,
            config,
        } => {
            // If no specific format is specified, generate all
            let gen_all = !man && !markdown && !config;

            if gen_all || man {
                generate_man_pages(&output)?;
            }
            if gen_all || markdown {
                generate_markdown(&output)?;
            }
            if gen_all || config {
                generate_config_reference(&output)?;
            }
        }
    }

    Ok(())
}

/// Generate man pages using clap_mangen
fn generate_man_pages(output: &Path) -> Result<()> {
    use clap_mangen::Man;

    let man_dir = output.join("man");
    fs::create_dir_all(&man_dir).context("Failed to create man directory")?;

    let cmd = Cli::command();
    let mut pages = vec![(BIN.to_string(), cmd.clone())];
    for subcommand in cmd.get_subcommands().filter(|c| !c.is_hide_set()) {
        pages.push((
            format!("{}-{}", BIN, subcommand.get_name()),
            subcommand.clone(),
        ));
    }

    for (name, page) in pages {
        let mut buffer = Vec::new();
        Man::new(page).render(&mut buffer)?;
        let path = man_dir.join(format!("{}.1", name));
        fs::write(&path, buffer)?;
        println!("Generated: {}", path.display());
    }
    Ok(())
}

/// `-s, --long` label for an option, None for positionals and help/version.
fn flag_label(arg: &Arg) -> Option<String> {
    let id = arg.get_id().as_str();
    if id == "help" || id == "version" {
        return None;
    }
    if arg.is_positional() {
        return Some(format!("<{}>", id.to_uppercase()));
    }
    let long = arg.get_long().map(|l| format!("--{}", l));
    let short = arg.get_short().map(|s| format!("-{}", s));
    match (short, long) {
        (Some(s), Some(l)) => Some(format!("{}, {}", s, l)),
        (None, Some(l)) => Some(l),
        (Some(s), None) => Some(s),
        (None, None) => None,
    }
}

fn push_command(markdown: &mut String, title: &str, cmd: &Command) {
    markdown.push_str(&format!("## {}\n\n", title));
    if let Some(about) = cmd.get_about() {
        markdown.push_str(&format!("{}\n\n", about));
    }

    let rows: Vec<(String, String)> = cmd
        .get_arguments()
        .filter_map(|arg| {
            let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
            flag_label(arg).map(|label| (label, help))
        })
        .collect();
    if !rows.is_empty() {
        markdown.push_str("| Argument | Description |\n");
        markdown.push_str("|----------|-------------|\n");
        for (label, help) in rows {
            markdown.push_str(&format!("| `{}` | {} |\n", label, help));
        }
        markdown.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about() {
        markdown.push_str("```\n");
        markdown.push_str(&format!("{}\n", long_about));
        markdown.push_str("```\n\n");
    }
}

/// Generate COMMANDS.md markdown documentation
fn generate_markdown(output: &Path) -> Result<()> {
    fs::create_dir_all(output).context("Failed to create output directory")?;

    let cmd = Cli::command();
    let mut markdown = String::new();

    markdown.push_str("# cdxj-indexer Command Reference\n\n");
    markdown.push_str("This document is auto-generated from the CLI definitions.\n\n");
    for subcommand in cmd.get_subcommands().filter(|c| !c.is_hide_set()) {
        let name = subcommand.get_name();
        markdown.push_str(&format!("- [{}](#{}-{})\n", name, BIN, name));
    }
    markdown.push_str("\n---\n\n");

    push_command(&mut markdown, BIN, &cmd);
    for subcommand in cmd.get_subcommands().filter(|c| !c.is_hide_set()) {
        let title = format!("{} {}", BIN, subcommand.get_name());
        push_command(&mut markdown, &title, subcommand);
        markdown.push_str("---\n\n");
    }

    markdown.push_str("\n*Generated by `cargo xtask gen-docs`*\n");

    let output_path = output.join("COMMANDS.md");
    fs::write(&output_path, markdown)?;
    println!("Generated: {}", output_path.display());
    Ok(())
}

/// Generate Configuration.md from the options-file documentation table
fn generate_config_reference(output: &Path) -> Result<()> {
    fs::create_dir_all(output).context("Failed to create output directory")?;

    let mut markdown = String::new();
    markdown.push_str("# Configuration\n\n");
    markdown.push_str(
        "Defaults for `cdxj-indexer index` can be kept in \
         `~/.config/cdxj-indexer/config.toml` or passed with `--config PATH`. \
         Command-line flags override the file.\n\n",
    );
    markdown.push_str("| Key | Default | Description |\n");
    markdown.push_str("|-----|---------|-------------|\n");
    for field in CONFIG_FIELDS {
        markdown.push_str(&format!(
            "| `{}` | `{}` | {} |\n",
            field.name, field.default_display, field.description
        ));
    }
    markdown.push_str("\n*Generated by `cargo xtask gen-docs`*\n");

    let output_path = output.join("Configuration.md");
    fs::write(&output_path, markdown)?;
    println!("Generated: {}", output_path.display());
    Ok(())
}
