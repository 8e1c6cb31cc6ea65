//! Command-line interface for flagscope
//!
//! A small `serve` / `db` command tree whose flags are resolved through the
//! library.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use flagscope::{Binder, BinderConfig};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

mod report;
mod serve;

/// Prefix of the environment variables the CLI reads, e.g. `FLAGSCOPE_SERVE_PORT`.
pub const ENV_PREFIX: &str = "FLAGSCOPE";

/// Name of the config file searched for in the working directory.
pub const CONFIG_NAME: &str = "flagscope";

pub fn command() -> Command {
    Command::new("flagscope")
        .about("Show how flags resolve across the command line, environment and config file")
        .version(clap::crate_version!())
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable verbose logging (sets log level to DEBUG); also read from FLAGSCOPE_VERBOSE and the config file"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .global(true)
                .value_name("FORMAT")
                .value_parser(["text", "yaml"])
                .default_value("text")
                .help("Print a resolution report (text) or the merged settings (yaml)"),
        )
        .subcommand(
            Command::new("serve")
                .about("Resolve the settings of a server")
                .arg(Arg::new("host").long("host").value_name("HOST").help("Address to bind"))
                .arg(
                    Arg::new("port")
                        .long("port")
                        .value_name("PORT")
                        .default_value("8080")
                        .help("Port to listen on"),
                ),
        )
        .subcommand(
            Command::new("db")
                .about("Database maintenance")
                .subcommand_required(true)
                .arg(
                    Arg::new("url")
                        .long("url")
                        .global(true)
                        .value_name("URL")
                        .help("Database connection URL"),
                )
                .subcommand(
                    Command::new("migrate")
                        .about("Apply schema migrations")
                        .arg(Arg::new("target").long("target").value_name("VERSION"))
                        .arg(Arg::new("dry-run").long("dry-run").action(ArgAction::SetTrue)),
                )
                .subcommand(Command::new("status").about("Show migration status")),
        )
}

fn binder_config() -> BinderConfig {
    BinderConfig::new()
        .default_config_name(CONFIG_NAME)
        .config_path(".")
        .env_prefix(ENV_PREFIX)
        .prefix_commands(true)
        .add_config_flag(true)
}

fn log_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    EnvFilter::from_default_env().add_directive(level.into())
}

pub fn run() -> Result<()> {
    let mut binder = Binder::new(binder_config());
    let cmd = binder.inject(command());
    let matches = cmd.clone().get_matches();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let cli_verbose = matches.get_flag("verbose");
    let (filter, filter_handle) = reload::Layer::new(log_filter(cli_verbose));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let invocation = binder.bind(&cmd, &matches).context("Failed to resolve flags")?;

    // verbose may also come from FLAGSCOPE_VERBOSE or the config file
    let resolved_verbose =
        invocation.value("verbose").and_then(|v| v.parse::<bool>().ok()).unwrap_or(false);
    if resolved_verbose && !cli_verbose {
        if let Err(err) = filter_handle.reload(log_filter(true)) {
            tracing::warn!(error = %err, "Could not raise log level");
        }
    }
    tracing::debug!(command = %invocation.command_path().join(" "), "Running command");

    match invocation.command_path().as_slice() {
        ["serve"] => serve::run(&invocation),
        _ => report::print(&invocation),
    }
}
