//! The `racecal` command-line interface.
//!
//! Wires the JSON-file ports from a TOML configuration into the sync engine.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
