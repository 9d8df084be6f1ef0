//! CLI argument parsing
//!
//! ```text
//! fivewhy [--config PATH] [--base-url URL] [--json] [-v] <command>
//!
//! COMMANDS:
//!   records list | show <id> | add ... | update <id> ... | delete <id> | search ...
//!   predict <description...> [--enhanced ...]
//!   history [--clear]
//!   suggest <query> [--from-catalog]
//!   catalog <root-causes|equipment-types|departments>
//!   summary | plots | trends | department-stats | root-cause-stats | health
//!   export [--output PATH]
//!   config show
//! ```

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fivewhy_core::{
    Catalog, Department, EquipmentType, FiveWhy, PredictionContext, RecordPatch, SearchFilter,
    Severity,
};
use std::path::PathBuf;

/// FiveWhy root-cause analysis client
#[derive(Debug, Parser)]
#[command(name = "fivewhy", version, about = "Client for the 5-Why root-cause analysis service")]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Configuration file (default: platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Service base URL, overriding configuration and environment
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Print pretty JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage incident records
    Records {
        #[command(subcommand)]
        action: RecordsCommand,
    },

    /// Predict the root cause of an issue
    Predict(PredictArgs),

    /// Show (or clear) recent predictions
    History {
        #[arg(long)]
        clear: bool,
    },

    /// Autocomplete candidates for partial input
    Suggest {
        query: String,

        /// Match against the service's known root causes
        #[arg(long)]
        from_catalog: bool,
    },

    /// Distinct values known to the service
    Catalog {
        #[arg(value_enum)]
        which: CatalogArg,
    },

    /// Aggregate counts
    Summary,

    /// Chart payloads
    Plots,

    /// Monthly incident counts
    Trends,

    /// Severity counts per department
    DepartmentStats,

    /// Root cause counts per equipment type
    RootCauseStats,

    /// Download every record as CSV
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Service liveness
    Health,

    /// Configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum RecordsCommand {
    /// All records
    List,

    /// One record
    Show { id: String },

    /// Create a record
    Add(AddArgs),

    /// Change some fields of a record
    Update(UpdateArgs),

    /// Delete a record
    Delete { id: String },

    /// Server-side filtered search
    Search(SearchArgs),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogArg {
    RootCauses,
    EquipmentTypes,
    Departments,
}

impl From<CatalogArg> for Catalog {
    fn from(arg: CatalogArg) -> Self {
        match arg {
            CatalogArg::RootCauses => Catalog::RootCauses,
            CatalogArg::EquipmentTypes => Catalog::EquipmentTypes,
            CatalogArg::Departments => Catalog::Departments,
        }
    }
}

/// Why-chain flags shared by add and update
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct ChainArgs {
    #[arg(long)]
    pub why1: Option<String>,
    #[arg(long)]
    pub why2: Option<String>,
    #[arg(long)]
    pub why3: Option<String>,
    #[arg(long)]
    pub why4: Option<String>,
    #[arg(long)]
    pub why5: Option<String>,
    #[arg(long)]
    pub solution: Option<String>,
}

impl ChainArgs {
    pub fn to_chain(&self) -> FiveWhy {
        FiveWhy {
            why1: self.why1.clone(),
            why2: self.why2.clone(),
            why3: self.why3.clone(),
            why4: self.why4.clone(),
            why5: self.why5.clone(),
            solution: self.solution.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct AddArgs {
    pub id: String,
    /// Equipment class; labels outside the usual set are kept as given
    #[arg(long = "type")]
    pub equipment_type: EquipmentType,
    #[arg(long, value_parser = Department::parse_known)]
    pub department: Department,
    #[arg(long, default_value = "Medium", value_parser = Severity::parse_known)]
    pub severity: Severity,
    #[arg(long)]
    pub issue: String,
    #[arg(long)]
    pub root_cause: String,
    /// Report date (YYYY-MM-DD), today when omitted
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[command(flatten)]
    pub chain: ChainArgs,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long = "type")]
    pub equipment_type: Option<EquipmentType>,
    #[arg(long, value_parser = Department::parse_known)]
    pub department: Option<Department>,
    #[arg(long, value_parser = Severity::parse_known)]
    pub severity: Option<Severity>,
    #[arg(long)]
    pub issue: Option<String>,
    #[arg(long)]
    pub root_cause: Option<String>,
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[command(flatten)]
    pub chain: ChainArgs,
}

impl UpdateArgs {
    /// Only the flags that were given
    pub fn to_patch(&self) -> RecordPatch {
        RecordPatch {
            equipment_type: self.equipment_type.clone(),
            department: self.department.clone(),
            severity: self.severity.clone(),
            issue: self.issue.clone(),
            root_cause: self.root_cause.clone(),
            why1: self.chain.why1.clone(),
            why2: self.chain.why2.clone(),
            why3: self.chain.why3.clone(),
            why4: self.chain.why4.clone(),
            why5: self.chain.why5.clone(),
            solution: self.chain.solution.clone(),
            date_reported: self.date,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct SearchArgs {
    #[arg(long = "type")]
    pub equipment_type: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub severity: Option<String>,
    #[arg(long)]
    pub root_cause: Option<String>,
    #[arg(long)]
    pub limit: Option<u32>,
}

impl SearchArgs {
    pub fn to_filter(&self) -> SearchFilter {
        SearchFilter {
            equipment_type: self.equipment_type.clone(),
            department: self.department.clone(),
            severity: self.severity.clone(),
            root_cause: self.root_cause.clone(),
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct PredictArgs {
    /// Issue description; several words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub description: Vec<String>,

    /// Use the context-aware endpoint (confidence and alternatives)
    #[arg(long)]
    pub enhanced: bool,

    #[arg(long, requires = "enhanced")]
    pub environment: Option<String>,
    #[arg(long, requires = "enhanced")]
    pub operating_load: Option<String>,
    #[arg(long, requires = "enhanced")]
    pub recent_maintenance: Option<String>,
    #[arg(long, requires = "enhanced")]
    pub severity: Option<String>,
    #[arg(long, requires = "enhanced")]
    pub shift_time: Option<String>,
    #[arg(long, requires = "enhanced")]
    pub machine_age_bucket: Option<String>,
    #[arg(long, requires = "enhanced")]
    pub maintenance_gap_days: Option<String>,
    #[arg(long, requires = "enhanced")]
    pub failure_frequency: Option<String>,
}

impl PredictArgs {
    pub fn description(&self) -> String {
        self.description.join(" ")
    }

    /// Service defaults for every flag left out
    pub fn context(&self) -> PredictionContext {
        let defaults = PredictionContext::default();
        let pick = |value: &Option<String>, default: String| value.clone().unwrap_or(default);
        PredictionContext {
            environment: pick(&self.environment, defaults.environment),
            operating_load: pick(&self.operating_load, defaults.operating_load),
            recent_maintenance: pick(&self.recent_maintenance, defaults.recent_maintenance),
            severity: pick(&self.severity, defaults.severity),
            shift_time: pick(&self.shift_time, defaults.shift_time),
            machine_age_bucket: pick(&self.machine_age_bucket, defaults.machine_age_bucket),
            maintenance_gap_days: pick(&self.maintenance_gap_days, defaults.maintenance_gap_days),
            failure_frequency: pick(&self.failure_frequency, defaults.failure_frequency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_update_patch_only_has_given_fields() {
        let cli = Cli::parse_from(["fivewhy", "records", "update", "EQ-1", "--severity", "critical"]);
        let Command::Records {
            action: RecordsCommand::Update(args),
        } = cli.command
        else {
            panic!("expected records update");
        };
        let patch = args.to_patch();
        assert_eq!(patch.severity, Some(Severity::Critical));
        assert!(patch.issue.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_context_defaults() {
        let cli = Cli::parse_from(["fivewhy", "predict", "pump", "leak", "--enhanced", "--shift-time", "night"]);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.description(), "pump leak");
        let context = args.context();
        assert_eq!(context.shift_time, "night");
        assert_eq!(context.environment, "clean");
    }
}
