//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Actor FSM Visualizer CLI
#[derive(Parser, Debug)]
#[command(name = "fsm-viz")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a state diagram from FSM source code
    Render {
        /// Source file to render (reads stdin when omitted)
        file: Option<PathBuf>,

        /// Output format (falls back to the configured default)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,

        /// Write the result to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Watch a source file and re-render on change
    Watch {
        /// Source file to watch
        file: PathBuf,

        /// Polling interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Parse a source file and report problems without rendering
    Check {
        /// Source file to check
        file: PathBuf,
    },
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Mermaid stateDiagram-v2 markup
    Mermaid,
    /// DOT format (Graphviz)
    Dot,
    /// JSON output
    Json,
    /// Plain text table
    Table,
}

impl OutputFormat {
    /// Resolve the effective format from the CLI flag and the config default.
    pub fn resolve(flag: Option<OutputFormat>, config: &Config) -> OutputFormat {
        if let Some(format) = flag {
            return format;
        }
        match config.default.format.as_str() {
            "dot" => OutputFormat::Dot,
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Mermaid,
        }
    }
}

/// Execute the CLI command
pub async fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::Render { .. } => commands::render::execute(args, config),
        Commands::Watch { .. } => commands::watch::execute(args, config).await,
        Commands::Check { file } => commands::check::execute(&file),
    }
}
