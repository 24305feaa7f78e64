// Delivery simulation runner
// Loads a reference snapshot (or a seeded synthetic fleet), runs one
// simulation, prints the KPI breakdowns and writes simulation-results/<run_id>.json
//
// Usage:
//   cargo run --bin simulate -- --snapshot data/snapshot.json
//   cargo run --bin simulate -- --synthetic --orders 200 --routes 12 --seed 42
//   cargo run --bin simulate -- --synthetic --drivers 5 --start "2025-01-15 09:00:00" --max-hours 8
//   cargo run --bin simulate -- --config rates.json --snapshot data/snapshot.json
//
// Log verbosity follows RUST_LOG (default: info).

mod report;
mod scenario;

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing_subscriber::EnvFilter;

use delivery_engine::params::ConfigError;
use delivery_engine::{DeliveryEngine, EngineConfig, EngineError, SimulateRequest, Snapshot};
use report::RunReport;
use scenario::ScenarioShape;

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("failed to write report: {0}")]
    Write(std::io::Error),

    #[error("{0}")]
    Engine(#[from] EngineError),
}

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    snapshot: Option<PathBuf>,
    config: Option<PathBuf>,
    synthetic: bool,
    orders: usize,
    routes: usize,
    seed: u64,
    drivers: String,
    start: String,
    max_hours: String,
}

fn parse_args() -> Result<CliArgs, CliError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        snapshot: None,
        config: None,
        synthetic: false,
        orders: 50,
        routes: 8,
        seed: 0,
        drivers: "3".to_string(),
        start: "2025-01-15 09:00:00".to_string(),
        max_hours: "8".to_string(),
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--synthetic" => cli.synthetic = true,
            "--snapshot" | "--config" | "--orders" | "--routes" | "--seed" | "--drivers"
            | "--start" | "--max-hours" => {
                i += 1;
                let value = args
                    .get(i)
                    .cloned()
                    .ok_or_else(|| CliError::Usage(format!("{flag} needs a value")))?;
                match flag {
                    "--snapshot" => cli.snapshot = Some(PathBuf::from(value)),
                    "--config" => cli.config = Some(PathBuf::from(value)),
                    "--orders" => cli.orders = parse_number(flag, &value)?,
                    "--routes" => cli.routes = parse_number(flag, &value)?,
                    "--seed" => cli.seed = parse_number(flag, &value)?,
                    "--drivers" => cli.drivers = value,
                    "--start" => cli.start = value,
                    _ => cli.max_hours = value,
                }
            }
            _ => eprintln!("Unknown argument: {}", flag),
        }
        i += 1;
    }

    if cli.snapshot.is_none() && !cli.synthetic {
        return Err(CliError::Usage(
            "pass --snapshot <file> or --synthetic".to_string(),
        ));
    }
    Ok(cli)
}

fn parse_number<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<T, CliError> {
    raw.parse()
        .map_err(|_| CliError::Usage(format!("{flag} expects a number, got {raw:?}")))
}

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn read_snapshot(path: &Path) -> Result<Snapshot, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn run(cli: CliArgs) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let mut engine = DeliveryEngine::with_config(config);

    let snapshot = match &cli.snapshot {
        Some(path) => read_snapshot(path)?,
        None => scenario::generate(&ScenarioShape {
            orders: cli.orders,
            routes: cli.routes,
            drivers: parse_number("--drivers", &cli.drivers).unwrap_or(0),
            seed: cli.seed,
        }),
    };

    println!("\n  Delivery Simulation Runner");
    match &cli.snapshot {
        Some(path) => println!("  Snapshot: {}", path.display()),
        None => println!(
            "  Synthetic fleet | PRNG: ChaCha8Rng | Seed: {} | Orders: {} | Routes: {}",
            cli.seed, cli.orders, cli.routes
        ),
    }

    let load = engine.load_snapshot_core(snapshot);
    for skipped in &load.skipped {
        println!("  skipped {} {}: {}", skipped.kind, skipped.id, skipped.reason);
    }

    let request = SimulateRequest {
        num_drivers: Some(json!(cli.drivers)),
        start_time: Some(cli.start.clone()),
        max_hours_per_day: Some(json!(cli.max_hours)),
    };
    let response = engine.simulate_core(&request)?;
    let run_id = response.run_id.as_str().to_string();

    let routes = engine.route_performance_core(Some(&run_id))?;
    let drivers = engine.driver_performance_core(Some(&run_id))?;

    let report = RunReport {
        load,
        response,
        simulation_run: routes.simulation_run,
        route_performance: routes.route_performance,
        driver_performance: drivers.driver_performance,
    };

    report::print_summary(&report);
    report::print_routes(&report.route_performance);
    report::print_drivers(&report.driver_performance);

    let path = report
        .write_json(Path::new(report::RESULTS_DIR))
        .map_err(CliError::Write)?;
    println!("\n  Results saved to: {}\n", path.display());
    Ok(())
}

fn main() {
    setup_tracing();

    let result = parse_args().and_then(run);
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
