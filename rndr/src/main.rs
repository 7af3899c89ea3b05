//! rndr - template renderer
//!
//! CLI entry point for checking, listing and rendering templates.

use std::io::{IsTerminal, Write};

use clap::{CommandFactory, Parser};
use eyre::{Context, Result};
use tracing::debug;

use rndr::cli::{Cli, Command};
use rndr::commands;
use rndr::config::{Config, Settings};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > WARN
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize logging: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;

    let config_log_level = Config::load_log_level(cli.config.as_ref(), &cwd);
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let mut out = std::io::stdout().lock();

    if cli.version || matches!(cli.command, Some(Command::Version)) {
        return commands::version(&mut out);
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = Config::load(cli.config.as_ref(), &cwd).context("Failed to load configuration")?;
    let settings = Settings::resolve(&cwd, &config, &command.overrides()).context("Invalid settings")?;
    debug!(?settings, "main: resolved settings");

    match command {
        Command::Check { .. } => commands::check(&settings, &mut out)?,
        Command::List { .. } => commands::list(&settings, &mut out)?,
        Command::Render { .. } => commands::render(&settings, &mut out)?,
        Command::Vars { .. } => commands::vars(&settings, &mut out)?,
        Command::Version => commands::version(&mut out)?,
    }

    out.flush()?;
    Ok(())
}
