//! CLI commands.

mod inspect;
mod machines;
mod scopes;
mod simulate;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::output::OutputFormat;

/// poolctl - Inspect and replay node-pool edit sessions.
#[derive(Debug, Parser)]
#[command(name = "poolctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json). Defaults to the configured format.
    #[arg(long, global = true)]
    format: Option<String>,

    /// Log filter, e.g. `info` or `gkepool_reconcile=debug`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "POOLCTL_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show a session's reconciled pool and derived values.
    Inspect(inspect::InspectCommand),

    /// Replay a session's edit batches.
    Simulate(simulate::SimulateCommand),

    /// List a session's machine choices.
    Machines(machines::MachinesCommand),

    /// Map and unmap OAuth scopes with the built-in catalog.
    Scopes(scopes::ScopesCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub fn run(self) -> Result<()> {
        let config = Config::load()?;

        let level = self.log_level.as_deref().unwrap_or(&config.log_level);
        crate::init_tracing(level, self.log_json);

        let format: OutputFormat = self
            .format
            .as_deref()
            .unwrap_or(&config.default_format)
            .parse()?;

        let ctx = CommandContext { format };

        match self.command {
            Commands::Inspect(cmd) => cmd.run(ctx),
            Commands::Simulate(cmd) => cmd.run(ctx),
            Commands::Machines(cmd) => cmd.run(ctx),
            Commands::Scopes(cmd) => cmd.run(ctx),
            Commands::Version => {
                println!("poolctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
#[derive(Debug)]
pub struct CommandContext {
    pub format: OutputFormat,
}
