//! # SourceFinder CLI (`sf`)
//!
//! Annotates AI research answers: resolves `[n]` citation markers against
//! the answer's sources and renders the result.
//!
//! ## Usage
//!
//! ```bash
//! sf [--config ./config/sf.toml] <command> [response.json]
//! ```
//!
//! The response is read from the given path, or from stdin when the path
//! is omitted or `-`.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sf annotate` | Render the answer with linked markers and a source panel |
//! | `sf check` | Report citation coverage; fail on unresolved markers |
//! | `sf sources` | List the response's source records |
//!
//! ## Examples
//!
//! ```bash
//! sf annotate response.json --format html
//! curl -s "$API/query" | sf check --policy exact
//! ```

use clap::{Parser, Subcommand};
use sourcefinder::render::OutputFormat;
use sourcefinder::{commands, config, logging};
use sourcefinder_core::ResolutionPolicy;
use std::path::PathBuf;

/// SourceFinder CLI — citation annotation for AI research answers.
#[derive(Parser)]
#[command(
    name = "sf",
    about = "SourceFinder — resolve and render citation markers in AI research answers",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (unless `RUST_LOG` is set).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an answer with resolved citation markers.
    ///
    /// Resolved markers link to their source, unresolved markers are
    /// flagged with a warning glyph. The source panel follows the answer.
    Annotate {
        /// Chat response JSON file (`-` or omitted for stdin).
        input: Option<PathBuf>,

        /// Output format: `plain`, `markdown`, `html`, or `json`.
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Resolution policy: `exact_then_positional`, `exact`, or `positional`.
        #[arg(long)]
        policy: Option<ResolutionPolicy>,

        /// Omit the source panel.
        #[arg(long)]
        no_sources: bool,
    },

    /// Summarise citation coverage.
    ///
    /// Exits with an error when any marker has no matching source.
    Check {
        /// Chat response JSON file (`-` or omitted for stdin).
        input: Option<PathBuf>,

        /// Resolution policy: `exact_then_positional`, `exact`, or `positional`.
        #[arg(long)]
        policy: Option<ResolutionPolicy>,
    },

    /// List the source records of a response.
    Sources {
        /// Chat response JSON file (`-` or omitted for stdin).
        input: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::Config::minimal(),
    };
    logging::init(&cfg.logging, cli.verbose)?;

    match cli.command {
        Commands::Annotate {
            input,
            format,
            policy,
            no_sources,
        } => {
            commands::run_annotate(&cfg, input.as_deref(), format, policy, !no_sources)?;
        }
        Commands::Check { input, policy } => {
            commands::run_check(&cfg, input.as_deref(), policy)?;
        }
        Commands::Sources { input } => {
            commands::run_sources(input.as_deref())?;
        }
    }

    Ok(())
}
