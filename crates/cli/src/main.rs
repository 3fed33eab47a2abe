// lanebook CLI - per-market shipment ledger allocation
//
// Stdout carries JSON results only; summaries, logs and errors go to stderr.

mod alloc;
mod exit_codes;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "lanebook")]
#[command(about = "Allocate shipment ledger revenue, cost and units to crossdock markets")]
#[command(version, long_version = long_version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an allocation from a TOML config file
    #[command(after_help = "\
Examples:
  lanebook run board.alloc.toml
  lanebook run board.alloc.toml --json | jq '.markets[0]'
  lanebook run board.alloc.toml --output result.json
  lanebook run board.alloc.toml --strict --shards 4")]
    Run {
        /// Path to the .alloc.toml config file
        config: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON output to file (overrides output.json in the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit 6 when any reconciliation warning is collected
        #[arg(long)]
        strict: bool,

        /// Worker threads; legs are partitioned by order
        #[arg(long, default_value_t = 1, env = "LANEBOOK_SHARDS")]
        shards: usize,
    },

    /// Validate an allocation config without running
    #[command(after_help = "\
Examples:
  lanebook validate board.alloc.toml")]
    Validate {
        /// Path to the .alloc.toml config file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("LANEBOOK_GIT_HASH"), ")",
        "\ntarget:  ", env!("LANEBOOK_TARGET"),
        "\njson:    rust_decimal amounts serialized as strings",
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging();

    let result = match cli.command {
        Commands::Run { config, json, output, strict, shards } => {
            alloc::cmd_run(config, json, output, strict, shards)
        }
        Commands::Validate { config } => alloc::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
