// SPDX-License-Identifier: MIT

//! `fwlp`: the launchpad CLI.

mod client;
mod commands;
mod confirm;
mod config;
mod exit_error;
mod output;

use clap::Parser;
use commands::Command;
use exit_error::ExitError;
use output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "fwlp",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")"),
    about = "Launchpad CLI for the workflow execution engine"
)]
struct Cli {
    /// Path to the launchpad WAL file, bypassing the config file.
    #[arg(short = 'l', long, global = true)]
    launchpad_file: Option<PathBuf>,
    /// Directory holding `fw_config.toml`.
    #[arg(short = 'c', long, global = true)]
    config_dir: Option<PathBuf>,
    /// Directory for log output (reserved; logs currently go to stderr).
    #[arg(long, global = true)]
    logdir: Option<PathBuf>,
    /// Log level (overrides `RUST_LOG`/`FW_LOGGING_FORMAT`).
    #[arg(long, global = true)]
    loglvl: Option<String>,
    /// Suppress informational output.
    #[arg(short = 's', long, global = true)]
    silencer: bool,
    /// Output format for query/admin results.
    #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

fn init_logging(loglvl: Option<&str>, silencer: bool) {
    let default_directive = if silencer {
        "error"
    } else {
        loglvl.unwrap_or("info")
    };
    let filter = std::env::var("FW_LOGGING_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(cli: Cli) -> Result<(), ExitError> {
    match cli.command {
        Command::Init => return commands::init_cmd(cli.config_dir.as_deref()),
        Command::Reset { password, yes } => {
            let launchpad_file = config::resolve_launchpad_file(cli.launchpad_file.as_deref(), cli.config_dir.as_deref())?;
            return commands::reset_cmd(&launchpad_file, password.as_deref(), yes);
        }
        _ => {}
    }

    let launchpad_file = config::resolve_launchpad_file(cli.launchpad_file.as_deref(), cli.config_dir.as_deref())?;
    let lp_config = match config::load(cli.config_dir.as_deref()) {
        Ok(cfg) => cfg.to_launchpad_config(),
        Err(_) => fwrs_engine::LaunchpadConfig::default(),
    };
    let launchpad = client::open_launchpad(&launchpad_file, lp_config)?;

    commands::dispatch(cli.command, &launchpad, cli.output)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.loglvl.as_deref(), cli.silencer);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.code.clamp(0, 255) as u8)
        }
    }
}
