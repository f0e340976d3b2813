//! CLI Adapter
//!
//! Command-line interface for the pump.fun launch watcher.
//! Uses clap derive macros for argument parsing.

mod commands;
mod console;

pub use commands::{
    replay_frames, resolve_search_input, CliApp, Command, HealthCmd, ReplayCmd, ReplaySummary,
    WatchCmd,
};
pub use console::{format_event, format_search, format_status, ConsoleObserver};

use anyhow::Result;

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    commands::execute(app).await
}
