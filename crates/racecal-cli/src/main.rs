//! racecal CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use racecal_core::{TracingConfig, init_tracing};

use racecal_cli::cli::{Cli, Command, ConfigAction, IdAction};
use racecal_cli::commands;
use racecal_cli::config::ClientConfig;
use racecal_cli::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = ClientConfig::load(cli.config.as_deref())?;

    let debug = cli.debug || config.debug;
    let tracing = match cli.command {
        Command::Watch => TracingConfig::daemon().with_level(if debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }),
        _ => TracingConfig::cli(debug),
    };
    init_tracing(tracing)?;

    match cli.command {
        Command::Sync {
            window,
            dry_run,
            json,
        } => commands::sync::run(&config, &window, dry_run, json).await,
        Command::Ingest { window, json } => commands::ingest::run(&config, &window, json).await,
        Command::Watch => commands::watch::run(&config).await,
        Command::Id { action } => match action {
            IdAction::Encode {
                race_type,
                date,
                venue,
                race,
                position,
            } => commands::id::encode(race_type, date, &venue, race, position),
            IdAction::Validate {
                race_type,
                kind,
                value,
            } => commands::id::validate(race_type, kind, &value),
        },
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, cli.config.as_deref()),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(cli.config.as_deref()),
        },
    }
}
