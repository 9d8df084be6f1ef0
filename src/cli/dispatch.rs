//! CLI command dispatch
//!
//! `run_cli` loads configuration, sets up logging, builds the application
//! context and maps the outcome to an exit code. `execute` runs one command
//! against a context and returns what should be printed.

use crate::cli::args::{Cli, Command, ConfigCommand, PredictArgs, RecordsCommand};
use crate::cli::{logging, output, Error, Result, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_SUCCESS};
use fivewhy_core::{AppContext, ClientConfig, ConfigManager, IncidentRecord, SuggestionSource};
use tracing::debug;

/// Exit code wrapper for CLI operations
pub type ExitCode = i32;

/// Run the parsed command line and return the process exit code
pub async fn run_cli(cli: Cli) -> ExitCode {
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let _log_guard = logging::init(&config.logging, cli.verbose);

    if let Command::Config {
        action: ConfigCommand::Show,
    } = &cli.command
    {
        return print_result(show_config(&config, cli.json));
    }

    let context = match AppContext::from_config(&config) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let outcome = execute(&context, cli.command, cli.json).await;
    context.shutdown();
    print_result(outcome)
}

fn print_result(outcome: Result<String>) -> ExitCode {
    match outcome {
        Ok(text) => {
            if !text.is_empty() {
                println!("{}", text);
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                Error::Config(_) => EXIT_CONFIG_ERROR,
                _ => EXIT_FAILURE,
            }
        }
    }
}

/// File (explicit or platform default), then environment, then `--base-url`
pub fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    }
    .map_err(Error::Config)?;

    let mut config = manager.into_config();
    if let Some(base_url) = &cli.base_url {
        config.service.base_url = base_url.clone();
        config.validate().map_err(Error::Config)?;
    }
    Ok(config)
}

fn show_config(config: &ClientConfig, json: bool) -> Result<String> {
    if json {
        return Ok(output::json(config)?);
    }
    toml::to_string_pretty(config).map_err(|e| Error::Config(e.into()))
}

/// Run one command and render its result
pub async fn execute(context: &AppContext, command: Command, json: bool) -> Result<String> {
    debug!("Dispatching {:?}", command);
    match command {
        Command::Records { action } => records(context, action, json).await,
        Command::Predict(args) => predict(context, args, json).await,
        Command::History { clear } => {
            if clear {
                context.predictions.clear_history().await?;
                return Ok("Prediction history cleared".to_string());
            }
            let history = context.predictions.history().await;
            if json {
                Ok(output::json(history.entries())?)
            } else {
                Ok(output::history(&history))
            }
        }
        Command::Suggest {
            query,
            from_catalog,
        } => {
            let suggestions = if from_catalog {
                context
                    .catalog
                    .root_cause_vocabulary()
                    .await?
                    .suggest(&query)
            } else {
                context.suggest(&query)
            };
            render(json, &suggestions, |s| output::lines(s, "No suggestions"))
        }
        Command::Catalog { which } => {
            let values = context.catalog.values(which.into()).await?;
            render(json, &values, |v| output::lines(v, "No values"))
        }
        Command::Summary => {
            let summary = context.analytics.fetch_summary().await?;
            render(json, &*summary, output::summary)
        }
        Command::Plots => {
            let plots = context.analytics.fetch_plots().await?;
            render(json, &*plots, output::plots)
        }
        Command::Trends => {
            let trends = context.analytics.fetch_trends().await?;
            render(json, &*trends, output::trends)
        }
        Command::DepartmentStats => {
            let stats = context.analytics.fetch_department_stats().await?;
            render(json, &*stats, |s| {
                output::cross_tab(&s.department_stats, "DEPARTMENT", "No department data")
            })
        }
        Command::RootCauseStats => {
            let stats = context.analytics.fetch_root_cause_stats().await?;
            render(json, &*stats, |s| {
                output::cross_tab(&s.root_cause_stats, "ROOT CAUSE", "No root cause data")
            })
        }
        Command::Export { output: path } => {
            let csv = context.analytics.export_csv().await?;
            match path {
                Some(path) => {
                    std::fs::write(&path, &csv).map_err(fivewhy_core::Error::from)?;
                    Ok(format!("Exported to {}", path.display()))
                }
                None => Ok(csv.trim_end().to_string()),
            }
        }
        Command::Health => {
            let health = context.health().await?;
            render(json, &health, output::health)
        }
        Command::Config { .. } => Err(Error::Config(anyhow::anyhow!(
            "config commands run without a service context"
        ))),
    }
}

async fn records(context: &AppContext, action: RecordsCommand, json: bool) -> Result<String> {
    let store = &context.records;
    match action {
        RecordsCommand::List => {
            let list = store.refresh().await?;
            render(json, list.as_slice(), output::record_table)
        }
        RecordsCommand::Show { id } => {
            let record = store.fetch(&id).await?;
            render(json, &record, output::record_detail)
        }
        RecordsCommand::Add(args) => {
            let mut record = IncidentRecord::new(
                args.id.as_str(),
                args.equipment_type,
                args.department,
                args.issue.as_str(),
                args.root_cause.as_str(),
            )
            .with_severity(args.severity)
            .with_chain(args.chain.to_chain());
            if let Some(date) = args.date {
                record = record.with_date(date);
            }
            let list = store.add(record).await?;
            confirm(json, &list, format!("Added {}", args.id))
        }
        RecordsCommand::Update(args) => {
            let list = store.update(&args.id, args.to_patch()).await?;
            confirm(json, &list, format!("Updated {}", args.id))
        }
        RecordsCommand::Delete { id } => {
            let list = store.remove(&id).await?;
            confirm(json, &list, format!("Deleted {}", id))
        }
        RecordsCommand::Search(args) => {
            let found = store.search(&args.to_filter()).await?;
            render(json, found.as_slice(), output::record_table)
        }
    }
}

async fn predict(context: &AppContext, args: PredictArgs, json: bool) -> Result<String> {
    let description = args.description();
    if args.enhanced {
        let result = context
            .predictions
            .predict_with_context(&description, &args.context())
            .await?;
        render(json, &result, output::enhanced_prediction)
    } else {
        let result = context.predictions.predict(&description).await?;
        render(json, &result, output::prediction)
    }
}

fn render<T, F>(json: bool, value: &T, text: F) -> Result<String>
where
    T: serde::Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    if json {
        Ok(output::json(value)?)
    } else {
        Ok(text(value))
    }
}

/// Mutations print a one-line confirmation, or the refreshed list as JSON
fn confirm(json: bool, list: &fivewhy_core::RecordList, message: String) -> Result<String> {
    if json {
        Ok(output::json(list.as_slice())?)
    } else {
        Ok(format!("{} ({} records)", message, list.len()))
    }
}
