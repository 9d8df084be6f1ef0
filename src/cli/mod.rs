//! CLI module
//!
//! Provides:
//! - Argument parsing (clap)
//! - Logging setup
//! - Command dispatch against an [`fivewhy_core::AppContext`]
//! - Text and JSON rendering

pub mod args;
pub mod dispatch;
pub mod logging;
pub mod output;

pub use args::{Cli, Command, ConfigCommand, RecordsCommand};
pub use dispatch::{execute, run_cli, ExitCode};

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0:#}")]
    Config(anyhow::Error),

    #[error("{0}")]
    Core(#[from] fivewhy_core::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Exit codes (deterministic)
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, Error>;
