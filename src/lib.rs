//! Actor FSM Visualizer
//!
//! A tool for converting actor-style finite state machine source code into
//! deterministic state diagrams.
//!
//! This library provides functionality for:
//! - Tokenizing FSM source with a tolerant, position-tracking lexer
//! - Extracting state declarations and guarded transition blocks
//! - Resolving local helper functions into inlined or fanned-out transitions
//! - Building a canonical state graph with a synthetic entry point
//! - Emitting Mermaid stateDiagram-v2 markup, DOT, JSON, or a text table

pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod state_machine;

pub use config::Config;
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
pub fn init_logging(level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
