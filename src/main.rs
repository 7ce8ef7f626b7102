//! mstviz CLI - Graphviz diagrams of repository snapshots and post threads
//!
//! Reads JSON from a file or stdin and writes DOT to stdout, a DOT file, or
//! (through the Graphviz `dot` binary) an image.

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use mstviz::mst::key_hash;
use mstviz::{
    build_mst_graph, build_thread_graph, check_snapshot, emit, leading_zero_depth,
    resolve_format, DiagramConfig, OutputFormat, Snapshot, ThreadView,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "mstviz")]
#[command(about = "Graphviz diagrams of atproto repository snapshots and post threads")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/mstviz/config.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagram a repository snapshot's Merkle Search Tree
    Mst {
        /// Input JSON file (stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output path; the extension picks the format (.dot, .png, .svg, .pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format, overriding the output extension
        #[arg(short = 'T', long)]
        format: Option<OutputFormat>,
        /// Do not draw placeholders for null sub-tree links
        #[arg(long)]
        no_null_links: bool,
        /// Show each key's tree depth in entry labels
        #[arg(long)]
        show_depth: bool,
        /// Report structural problems in the tree as warnings
        #[arg(long)]
        check: bool,
    },

    /// Diagram a getPostThread response
    Thread {
        /// Input JSON file (stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output path; the extension picks the format (.dot, .png, .svg, .pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format, overriding the output extension
        #[arg(short = 'T', long)]
        format: Option<OutputFormat>,
        /// Author handle to highlight (repeatable)
        #[arg(long)]
        highlight: Vec<String>,
    },

    /// Print the tree depth of record keys
    Depth {
        /// Keys such as app.bsky.feed.post/3kabc
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = DiagramConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Mst {
            file,
            output,
            format,
            no_null_links,
            show_depth,
            check,
        } => {
            config.null_links &= !no_null_links;
            config.show_depth |= show_depth;

            let snapshot = Snapshot::from_json(&read_input(file.as_deref())?)
                .context("failed to parse snapshot")?;
            if check {
                let diagnostics = check_snapshot(&snapshot)?;
                info!(problems = diagnostics.len(), "checked tree");
            }

            let format = resolve_format(format, output.as_deref())?;
            let graph = build_mst_graph(&snapshot, &config)?;
            emit(&graph, output.as_deref(), format, &config)?;
        }

        Commands::Thread {
            file,
            output,
            format,
            highlight,
        } => {
            config.highlight_handles.extend(highlight);

            let thread = ThreadView::from_json(&read_input(file.as_deref())?)
                .context("failed to parse thread")?;
            if thread.post.is_none() {
                warn!("thread has no anchor post");
            }

            let format = resolve_format(format, output.as_deref())?;
            let graph = build_thread_graph(&thread, &config);
            emit(&graph, output.as_deref(), format, &config)?;
        }

        Commands::Depth { keys } => {
            for key in keys {
                println!(
                    "{}\t{}\t{}",
                    leading_zero_depth(&key),
                    hex::encode(key_hash(&key)),
                    key
                );
            }
        }
    }

    Ok(())
}

/// Log to stderr; stdout carries the diagram
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}
