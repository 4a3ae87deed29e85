//! DENM dissemination simulator CLI
//!
//! Runs the crash and witness scenarios over the available infrastructure
//! deployments, deterministically per seed.

use clap::Parser;
use denm_sim::scenarios::ScenarioId;
use denm_sim::{ScenarioResult, ScenarioRunner, SimConfig, SimError, SimExport};
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// DENM dissemination simulator
#[derive(Parser, Debug)]
#[command(name = "denm-sim")]
#[command(about = "Deterministic DENM dissemination study over terrestrial and satellite relays", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,
    
    /// Number of consecutive seeds to run (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,
    
    /// Scenario to run (crashed_terrestrial, ..., witness_hybrid, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,
    
    /// Number of vehicles
    #[arg(short = 'n', long, default_value = "20")]
    vehicles: usize,
    
    /// Relays per infrastructure type
    #[arg(short, long, default_value = "1")]
    relays: usize,
    
    /// Simulated duration in seconds
    #[arg(short, long, default_value = "210")]
    duration: f64,
    
    /// Receiver deadline in seconds
    #[arg(long, default_value = "0.5")]
    deadline: f64,
    
    /// Witness reaction delay in seconds
    #[arg(long, env = "DENM_WITNESS_DELAY", default_value = "3.0")]
    witness_delay: f64,
    
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
    
    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
    
    /// Export the run (scalars and summary) to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn parse_scenarios(name: &str) -> Result<Vec<ScenarioId>, SimError> {
    if name == "all" {
        return Ok(ScenarioId::all());
    }
    name.parse()
        .map(|scenario| vec![scenario])
        .map_err(|_| SimError::UnknownScenario(name.to_string()))
}

fn base_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(42)
}

fn print_json(results: &[ScenarioResult], failed: usize) -> Result<(), SimError> {
    let summary = serde_json::json!({
        "total": results.len(),
        "passed": results.len() - failed,
        "failed": failed,
        "results": results.iter().map(|r| {
            serde_json::json!({
                "scenario": r.scenario.name(),
                "seed": r.seed,
                "passed": r.passed,
                "events": r.events_processed,
                "time_secs": r.final_time_secs,
                "failure_reason": r.failure_reason,
                "summary": r.summary,
            })
        }).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run(args: &Args) -> Result<usize, SimError> {
    let scenarios = parse_scenarios(&args.scenario)?;
    
    if args.export.is_some() && (scenarios.len() > 1 || args.seeds > 1) {
        return Err(SimError::InvalidParameter(
            "--export only supports a single scenario and seed".to_string(),
        ));
    }
    
    let seed = base_seed(args.seed);
    let config = SimConfig::default()
        .with_vehicles(args.vehicles)
        .with_relays(args.relays)
        .with_duration(args.duration)
        .with_deadline(args.deadline)
        .with_witness_delay(args.witness_delay);
    config.validate()?;
    
    let mut results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;
    
    for seed_offset in 0..args.seeds {
        let seed = seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(seed).with_config(config.clone().with_seed(seed));
        
        for scenario in &scenarios {
            let result = runner.run(*scenario)?;
            
            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED: PDR {:.1}%, median delay {:.1}ms",
                        scenario.name(),
                        seed,
                        result.summary.delivery_ratio * 100.0,
                        result.summary.reception_delay.median * 1000.0
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
            
            if let Some(path) = &args.export {
                SimExport::from_result(&result, runner.config()).write_to_file(path)?;
                info!("Exported {} scalars to {}", result.scalars.len(), path);
            }
            
            if !result.passed {
                failed_count += 1;
            }
            results.push(result);
        }
    }
    
    if args.json {
        print_json(&results, failed_count)?;
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed_count == 0 {
            info!("All {} scenario runs passed", results.len());
        } else {
            error!("{}/{} scenario runs failed", failed_count, results.len());
        }
    }
    
    Ok(failed_count)
}

fn main() -> ExitCode {
    let args = Args::parse();
    
    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
    
    if !args.json {
        info!("DENM dissemination simulator v{}", env!("CARGO_PKG_VERSION"));
    }
    
    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            if matches!(e, SimError::UnknownScenario(_)) {
                eprintln!("Available scenarios: {}, all", ScenarioId::all().iter().map(|s| s.name()).collect::<Vec<_>>().join(", "));
            }
            ExitCode::FAILURE
        }
    }
}
