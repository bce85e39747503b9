//! Console front end for the route planner.
//!
//! # Responsibility
//! - Map command-line inputs onto the collector inputs the core expects.
//! - Run one route creation against the configured services and print it.
//! - Optionally walk the route stop by stop, as a field agent would.

use clap::{Args, Parser, Subcommand};
use fieldroute_core::{
    build_http_orchestrator, default_log_level, init_logging, init_stderr_logging,
    normalize_address, AddressRecord, CollectorInputs, CreateOutcome, RecordingMapSurface,
    RouteConfig,
};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "fieldroute", version, about = "Plan an optimized visiting route")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Geocode, order and print a route.
    Plan(PlanArgs),
}

#[derive(Debug, Args)]
struct PlanArgs {
    /// JSON array of imported address rows.
    #[arg(long = "input", value_name = "FILE")]
    input: Option<PathBuf>,
    /// Start address.
    #[arg(long = "start", value_name = "ADDRESS", default_value = "")]
    start: String,
    /// Destination typed by hand; repeat for several.
    #[arg(long = "stop", value_name = "ADDRESS")]
    stops: Vec<String>,
    /// Imported row to route, matched by address; repeat for several.
    #[arg(long = "select", value_name = "ADDRESS")]
    select: Vec<String>,
    /// Route every imported row.
    #[arg(long = "all-imported", action = clap::ArgAction::SetTrue)]
    all_imported: bool,
    /// JSON config file.
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
    /// SQLite geocode cache (overrides config).
    #[arg(long = "cache-db", value_name = "PATH")]
    cache_db: Option<PathBuf>,
    /// Absolute directory for rotating log files; stderr when omitted.
    #[arg(long = "log-dir", value_name = "DIR")]
    log_dir: Option<String>,
    /// Log level spec, e.g. `debug` or `fieldroute_core=trace`.
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,
    /// Step through the route after printing it.
    #[arg(long = "navigate", action = clap::ArgAction::SetTrue)]
    navigate: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Plan(args) => plan(args).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            warn!("event=plan module=cli status=error");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn plan(args: PlanArgs) -> Result<(), String> {
    let level = args.log_level.as_deref().unwrap_or(default_log_level());
    match &args.log_dir {
        Some(dir) => init_logging(level, dir)?,
        None => init_stderr_logging(level)?,
    }

    let mut config = match &args.config {
        Some(path) => RouteConfig::load(path).map_err(|err| err.to_string())?,
        None => RouteConfig::default(),
    };
    config.apply_env_overrides().map_err(|err| err.to_string())?;
    if let Some(path) = &args.cache_db {
        config.cache_db_path = Some(path.clone());
    }

    let inputs = collector_inputs(&args)?;
    let orchestrator = build_http_orchestrator(&config, RecordingMapSurface::new())
        .map_err(|err| err.to_string())?;

    let outcome = orchestrator
        .create_route(&inputs)
        .await
        .map_err(|err| err.to_string())?;
    info!(
        "event=plan module=cli status=ok route_id={} stops={} reused={} warnings={}",
        outcome.route().id(),
        outcome.route().len(),
        outcome.is_reused(),
        outcome.warnings().len()
    );
    print_outcome(&outcome);

    if args.navigate {
        let index = orchestrator.start_navigation().map_err(|err| err.to_string())?;
        print_position(index, orchestrator.navigation().progress());
        while let Some(index) = orchestrator.next() {
            print_position(index, orchestrator.navigation().progress());
        }
        orchestrator.stop_navigation();
        info!(
            "event=navigate module=cli status=ok stops_visited={}",
            outcome.route().len()
        );
    }
    Ok(())
}

fn collector_inputs(args: &PlanArgs) -> Result<CollectorInputs, String> {
    let imported = match &args.input {
        Some(path) => read_records(path)?,
        None => Vec::new(),
    };

    let mut shape_selection = Vec::new();
    for wanted in &args.select {
        let key = normalize_address(wanted);
        match imported
            .iter()
            .find(|record| normalize_address(&record.address) == key)
        {
            Some(record) => shape_selection.push(record.clone()),
            None => shape_selection.push(AddressRecord::new(wanted.as_str())),
        }
    }

    Ok(CollectorInputs {
        start: args.start.clone(),
        destinations: args.stops.clone(),
        shape_selection,
        imported,
        route_all_imported: args.all_imported,
    })
}

fn read_records(path: &Path) -> Result<Vec<AddressRecord>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    serde_json::from_str(&raw).map_err(|err| format!("invalid input {}: {err}", path.display()))
}

fn print_outcome(outcome: &CreateOutcome) {
    for warning in outcome.warnings() {
        warn!("event=collect module=cli status=warning");
        println!("warning: {warning}");
    }
    let route = outcome.route();
    let verb = if outcome.is_reused() { "reused" } else { "created" };
    println!("route {} {verb} with {} stops", route.id(), route.len());
    for (index, stop) in route.stops().iter().enumerate() {
        match stop.valid_coordinates() {
            Some(point) => println!(
                "{:>3}. {} ({:.6}, {:.6})",
                index + 1,
                stop.candidate.label(),
                point.lat,
                point.lng
            ),
            None => println!("{:>3}. {}", index + 1, stop.candidate.label()),
        }
    }
}

fn print_position(index: usize, progress: Option<String>) {
    println!(
        "navigate: stop {} [{}]",
        index + 1,
        progress.unwrap_or_default()
    );
}

#[cfg(test)]
mod tests {
    use super::{collector_inputs, Cli, Command};
    use clap::Parser;

    fn plan_args(argv: &[&str]) -> super::PlanArgs {
        let cli = Cli::try_parse_from(argv).expect("arguments should parse");
        match cli.command {
            Command::Plan(args) => args,
        }
    }

    #[test]
    fn plan_flags_map_onto_collector_inputs() {
        let args = plan_args(&[
            "fieldroute",
            "plan",
            "--start",
            "100 Main St",
            "--stop",
            "200 Oak Ave",
            "--stop",
            "300 Elm St",
            "--select",
            "400 Pine Rd",
            "--all-imported",
        ]);

        let inputs = collector_inputs(&args).expect("inputs without a file");

        assert_eq!(inputs.start, "100 Main St");
        assert_eq!(inputs.destinations, vec!["200 Oak Ave", "300 Elm St"]);
        assert_eq!(inputs.shape_selection.len(), 1);
        assert_eq!(inputs.shape_selection[0].address, "400 Pine Rd");
        assert!(inputs.imported.is_empty());
        assert!(inputs.route_all_imported);
    }

    #[test]
    fn missing_input_file_is_reported() {
        let args = plan_args(&["fieldroute", "plan", "--input", "/nonexistent/rows.json"]);
        let error = collector_inputs(&args).unwrap_err();
        assert!(error.contains("failed to read"));
    }
}
