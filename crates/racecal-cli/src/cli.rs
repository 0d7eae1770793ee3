//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use racecal_core::{IdentityKind, RaceType};

/// racecal - keep a calendar in line with the racing schedule
#[derive(Debug, Parser)]
#[command(name = "racecal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "RACECAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bring the calendar in line with stored races
    Sync {
        #[command(flatten)]
        window: WindowArgs,

        /// Plan without touching the calendar
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read races from the source into storage
    Ingest {
        #[command(flatten)]
        window: WindowArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run ingest and sync periodically until interrupted
    Watch,

    /// Identity commands
    Id {
        #[command(subcommand)]
        action: IdAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Which days and race types a run covers.
#[derive(Debug, Clone, Default, Args)]
pub struct WindowArgs {
    /// First local (JST) day, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Number of days, overriding `window_days`
    #[arg(long)]
    pub days: Option<u32>,

    /// Race type to process (can be repeated). Defaults to the configured list.
    #[arg(long = "race-type", short = 't', action = clap::ArgAction::Append)]
    pub race_types: Vec<RaceType>,
}

#[derive(Debug, Subcommand)]
pub enum IdAction {
    /// Print the identity of a meeting, race or participant
    Encode {
        race_type: RaceType,

        /// Local date, YYYY-MM-DD
        date: NaiveDate,

        /// Venue name
        venue: String,

        /// Race number (1-12)
        race: Option<u8>,

        /// Position number
        #[arg(requires = "race")]
        position: Option<u8>,
    },

    /// Check an identity and print its components
    Validate {
        race_type: RaceType,

        /// place, race or participant
        kind: IdentityKind,

        value: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_arguments() {
        let cli = Cli::parse_from([
            "racecal", "sync", "--from", "2024-12-22", "--days", "2", "-t", "jra", "-t", "keirin",
            "--dry-run",
        ]);
        let Command::Sync {
            window, dry_run, ..
        } = cli.command
        else {
            panic!("expected sync");
        };
        assert!(dry_run);
        assert_eq!(window.from, NaiveDate::from_ymd_opt(2024, 12, 22));
        assert_eq!(window.days, Some(2));
        assert_eq!(window.race_types, vec![RaceType::Jra, RaceType::Keirin]);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["racecal", "watch", "--debug", "--config", "/tmp/c.toml"]);
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn position_requires_race() {
        let cli = Cli::parse_from(["racecal", "id", "encode", "keirin", "2025-01-04", "平塚", "11", "7"]);
        let Command::Id {
            action: IdAction::Encode { race, position, .. },
        } = cli.command
        else {
            panic!("expected id encode");
        };
        assert_eq!(race, Some(11));
        assert_eq!(position, Some(7));
    }

    #[test]
    fn unknown_race_type_is_rejected() {
        assert!(Cli::try_parse_from(["racecal", "ingest", "-t", "horse"]).is_err());
    }
}
