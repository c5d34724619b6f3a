//! CLI for inspecting and dry-running response-action policies.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use respol_core::config::{self, RespolConfig};
use std::path::PathBuf;

use commands::{run_classify, run_show, run_simulate, run_validate};

/// Top-level CLI for respol.
#[derive(Debug, Parser)]
#[command(name = "respol")]
#[command(about = "respol: HTTP stage response-action policies", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/respol/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Which failure a simulation replays.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SimulateTarget {
    /// HTTP status code returned on every attempt.
    #[arg(long)]
    pub status: Option<u16>,

    /// Timeout message raised on every attempt (classified with the configured markers).
    #[arg(long, value_name = "MESSAGE")]
    pub timeout: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Check the configured policies and report every issue.
    Validate,

    /// Print the effective policy table and timeout markers.
    Show,

    /// Classify a timeout message the way a failed attempt would be.
    Classify {
        /// Message text of the timeout error.
        message: String,

        /// Report the timeout as the cause of a transport error instead of the error itself.
        #[arg(long)]
        wrapped: bool,

        /// Raise a pipeline timeout instead of a socket timeout.
        #[arg(long)]
        pipeline: bool,
    },

    /// Replay the same failure and print each decision (no real sleeping).
    Simulate {
        #[command(flatten)]
        target: SimulateTarget,

        /// Number of consecutive failed attempts to replay.
        #[arg(long, default_value = "5", value_name = "N")]
        attempts: u32,

        /// Print one JSON object per decision.
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<RespolConfig> {
    match path {
        Some(p) => config::load_from(p),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_ref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Validate => run_validate(&cfg)?,
            CliCommand::Show => run_show(&cfg)?,
            CliCommand::Classify {
                message,
                wrapped,
                pipeline,
            } => run_classify(&cfg, &message, wrapped, pipeline)?,
            CliCommand::Simulate {
                target,
                attempts,
                json,
            } => run_simulate(&cfg, &target, attempts, json)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
