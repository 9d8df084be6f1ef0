//! FiveWhy: command-line client for the 5-Why root-cause analysis service
//!
//! Every screen action of the service's web front end maps to one subcommand;
//! the state and sync layer itself lives in `fivewhy-core`.

pub mod cli;

pub use cli::{execute, run_cli, Cli, Command};
