//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::error::Result;
use crate::state_machine::{Analysis, analyze};
use std::io::Read as _;
use std::path::Path;

/// Read the source snapshot for a command, either from a file or stdin.
fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Render command implementation
pub mod render {
    use super::*;
    use crate::cli::{Cli, Commands, OutputFormat};
    use crate::config::Config;

    /// Execute the render command
    pub fn execute(args: Cli, config: Config) -> Result<()> {
        let (file, output, out) = match args.command {
            Commands::Render { file, output, out } => (file, output, out),
            _ => unreachable!("render::execute called with wrong command"),
        };

        let format = OutputFormat::resolve(output, &config);
        let source = read_source(file.as_deref())?;

        let analysis = analyze(&source)?;
        tracing::info!(
            "rendered {} states, {} transitions",
            analysis.graph.declared_states().len(),
            analysis.graph.transition_count()
        );

        let rendered = render_format(&analysis, format)?;
        match out {
            Some(path) => std::fs::write(path, rendered)?,
            None => print!("{}", rendered),
        }
        Ok(())
    }

    fn render_format(analysis: &Analysis, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Mermaid => Ok(format!("{}\n", analysis.markup)),
            OutputFormat::Dot => Ok(analysis.graph.to_dot()),
            OutputFormat::Json => {
                let mut buf = Vec::new();
                crate::cli::output::output_json(&mut buf, analysis)?;
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            OutputFormat::Table => {
                let mut buf = Vec::new();
                crate::cli::output::output_table(&mut buf, analysis)?;
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
        }
    }
}

/// Watch command implementation
pub mod watch {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::config::Config;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::sync::mpsc;

    enum Update {
        Markup(String),
        Failed(String),
    }

    /// Execute the watch command
    pub async fn execute(args: Cli, config: Config) -> Result<()> {
        let (file, interval_ms) = match args.command {
            Commands::Watch { file, interval_ms } => {
                (file, interval_ms.unwrap_or(config.watch.interval_ms))
            }
            _ => unreachable!("watch::execute called with wrong command"),
        };

        // Initial render before entering the poll loop.
        let source = std::fs::read_to_string(&file)?;
        match analyze(&source) {
            Ok(analysis) => println!("{}", analysis.markup),
            Err(e) => eprintln!("{}", e),
        }

        let (tx_sender, mut rx_receiver) = mpsc::channel(1);
        tokio::spawn(poll_file(file, source, interval_ms, tx_sender));

        tracing::info!("Watching for changes (poll every {}ms)...", interval_ms);
        while let Some(update) = rx_receiver.recv().await {
            match update {
                Update::Markup(markup) => println!("{}", markup),
                Update::Failed(message) => eprintln!("{}", message),
            }
        }
        Ok(())
    }

    /// Poll the file and send a fresh render whenever its content changes.
    async fn poll_file(
        file: PathBuf,
        mut last_source: String,
        interval_ms: u64,
        sender: mpsc::Sender<Update>,
    ) {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        interval.tick().await; // First tick is immediate; the initial render already happened.
        loop {
            interval.tick().await;

            let source = match std::fs::read_to_string(&file) {
                Ok(s) => s,
                Err(e) => {
                    tracing::debug!("poll failed: {}", e);
                    continue;
                }
            };
            if source == last_source {
                continue;
            }
            last_source = source.clone();

            let update = match analyze(&source) {
                Ok(analysis) => Update::Markup(analysis.markup),
                Err(e) => Update::Failed(e.to_string()),
            };
            if sender.send(update).await.is_err() {
                break; // Receiver closed
            }
        }
    }
}

/// Check command implementation
pub mod check {
    use super::*;
    use crate::ensure;
    use crate::state_machine::analyzer;
    use std::path::Path;

    /// Execute the check command
    pub fn execute(file: &Path) -> Result<()> {
        ensure!(file.exists(), "source file not found: {:?}", file);
        tracing::info!("Checking {:?}", file);

        let source = std::fs::read_to_string(file)?;
        let analysis = match analyze(&source) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("❌ {}", e);
                return Err(e);
            }
        };

        let report = analyzer::detect_pattern(&analysis.graph);
        let stats = analysis.graph.stats();

        println!("📋 FSM Check Report");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("File: {:?}", file);
        println!();
        println!("States:      {}", stats.total_states);
        println!("Transitions: {}", stats.total_transitions);
        println!("Terminal:    {}", stats.terminal_transitions);
        println!("Pattern:     {}", report.pattern.display_name());
        if let Some(entry) = &analysis.graph.entry_state {
            println!("Entry state: {}", entry);
        }
        println!();

        if !analysis.warnings.is_empty() {
            println!("⚠️  Warnings:");
            for warning in &analysis.warnings {
                println!("   {}", warning);
            }
            println!();
        }

        ensure!(
            stats.total_states > 0,
            "no state declarations found in {:?}",
            file
        );

        println!("✅ Source parses cleanly");
        Ok(())
    }
}
