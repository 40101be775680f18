//! Bulletin CLI Binary
//!
//! Runs the generation pipeline, or one of its diagnostic commands, for a
//! workspace.

use bulletin::cli::{map_error, Cli, Commands, RunContext};
use bulletin::config::ConfigLoader;
use bulletin::error::PipelineError;
use bulletin::logging::{init_logging, LoggingConfig};
use bulletin::persist::append_error_line;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Bulletin CLI starting");
    let command = cli.command();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail(&cli, &command, None, &PipelineError::Io(e)),
    };

    let context = match RunContext::new(cli.workspace.clone(), cli.config.clone())
        .and_then(|ctx| ctx.with_policy(cli.policy.as_deref()))
    {
        Ok(ctx) => ctx,
        Err(e) => fail(&cli, &command, None, &e),
    };

    match runtime.block_on(context.execute(&command)) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => fail(&cli, &command, Some(context.error_log_path()), &e),
    }
}

/// Report a fatal error; pipeline runs also leave a line in the diagnostic log.
fn fail(cli: &Cli, command: &Commands, error_log: Option<PathBuf>, e: &PipelineError) -> ! {
    error!(error = %e, "Command failed");
    eprintln!("{}", map_error(e));

    if *command == Commands::Run {
        let path = error_log.unwrap_or_else(|| cli.workspace.join("error.log"));
        if let Err(log_err) = append_error_line(&path, Utc::now(), &format!("error: {}", e)) {
            eprintln!("Failed to write {}: {}", path.display(), log_err);
        }
    }
    process::exit(1);
}

/// Build logging configuration from CLI args and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.workspace)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if cli.quiet {
        config.level = "error".to_string();
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    } else if config.file.is_relative() {
        config.file = cli.workspace.join(&config.file);
    }

    config
}
