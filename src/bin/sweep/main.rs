// Gauntlet Sweep Runner — unconditional-fee grid evaluation
// Seeded runs per cell, honest + jamming workloads, JSON report output
//
// Usage:
//   cargo run --release --bin sweep                       # wheel scenario, default grids
//   cargo run --release --bin sweep -- --runs 30          # more seeds per cell
//   cargo run --release --bin sweep -- --seed 42          # custom base seed
//   cargo run --release --bin sweep -- --duration 60
//   cargo run --release --bin sweep -- --snapshot ln.json # external topology (honest only)
//   cargo run --release --bin sweep -- --base-coeffs 0,1 --rate-coeffs 0,2

mod report;
mod runner;
mod scenarios;

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use gauntlet_engine::SimulationParams;
use report::{SweepCell, SweepReport};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    duration: f64,
    snapshot: Option<String>,
    base_coeffs: Vec<f64>,
    rate_coeffs: Vec<f64>,
}

fn parse_coeff_list(raw: &str) -> Vec<f64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<f64>().ok())
        .collect()
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        runs: 10,
        seed: 0,
        duration: 30.0,
        snapshot: None,
        base_coeffs: vec![0.0, 0.5, 1.0, 2.0],
        rate_coeffs: vec![0.0, 0.5, 1.0, 2.0],
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(10);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            "--duration" => {
                i += 1;
                if i < args.len() {
                    cli.duration = args[i].parse().unwrap_or(30.0);
                }
            }
            "--snapshot" => {
                i += 1;
                if i < args.len() {
                    cli.snapshot = Some(args[i].clone());
                }
            }
            "--base-coeffs" => {
                i += 1;
                if i < args.len() {
                    cli.base_coeffs = parse_coeff_list(&args[i]);
                }
            }
            "--rate-coeffs" => {
                i += 1;
                if i < args.len() {
                    cli.rate_coeffs = parse_coeff_list(&args[i]);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

// ─── Table helpers ──────────────────────────────────────────────────────────

/// Attacker spend in a jamming cell: what the attacker's two own nodes
/// lost in upfront fees, averaged across runs.
fn attacker_cost(cell: &SweepCell, attacker_nodes: &[String]) -> f64 {
    cell.jamming
        .as_ref()
        .map(|jam| {
            -attacker_nodes
                .iter()
                .map(|n| jam.mean_revenues.get(n).copied().unwrap_or(0.0))
                .sum::<f64>()
        })
        .unwrap_or(0.0)
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();
    let cli = parse_args();

    let scenario = match &cli.snapshot {
        Some(path) => {
            let json = match std::fs::read_to_string(path) {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("Cannot read snapshot {path}: {e}");
                    std::process::exit(1);
                }
            };
            match gauntlet_engine::parse_snapshot(&json) {
                Ok(specs) => scenarios::from_snapshot(path.clone(), specs),
                Err(e) => {
                    eprintln!("Cannot parse snapshot {path}: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => scenarios::wheel(),
    };

    let params = SimulationParams { duration: cli.duration, ..Default::default() };
    let attacker_nodes: Vec<String> = scenario
        .attack
        .as_ref()
        .map(|a| vec![a.sender.0.clone(), a.receiver.0.clone()])
        .unwrap_or_default();

    println!("\n  Gauntlet Sweep Runner v0.2");
    println!(
        "  PRNG: ChaCha8Rng | Runs/cell: {} | Base seed: {} | Scenario: {}",
        cli.runs, cli.seed, scenario.name
    );
    println!(
        "  Grid: {} base x {} rate coefficients, duration {}s\n",
        cli.base_coeffs.len(),
        cli.rate_coeffs.len(),
        cli.duration
    );
    println!(
        "  {:>6} {:>6} {:>9} {:>9} {:>9} {:>9} {:>12}",
        "base", "rate", "h-sent", "h-deliv", "j-sent", "j-jams", "atk-cost"
    );
    println!("  {}", "-".repeat(66));

    let sweep_start = Instant::now();
    let mut cells = Vec::new();

    for &base in &cli.base_coeffs {
        for &rate in &cli.rate_coeffs {
            let cell = runner::run_cell(&scenario, &params, base, rate, cli.runs, cli.seed);

            let (j_sent, j_jams) = cell
                .jamming
                .as_ref()
                .map(|j| (j.num_sent.mean, j.num_failed.mean))
                .unwrap_or((0.0, 0.0));
            println!(
                "  {:>6.2} {:>6.2} {:>9.1} {:>9.1} {:>9.1} {:>9.1} {:>12.1}",
                base,
                rate,
                cell.honest.num_sent.mean,
                cell.honest.num_reached_receiver.mean,
                j_sent,
                j_jams,
                attacker_cost(&cell, &attacker_nodes),
            );
            cells.push(cell);
        }
    }

    println!(
        "  {}\n  {} cells in {:.1}s\n",
        "-".repeat(66),
        cells.len(),
        sweep_start.elapsed().as_secs_f64()
    );

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before unix epoch")
        .as_millis();
    let report = SweepReport {
        timestamp: format!("{ts}"),
        version: "0.2.0",
        prng: "ChaCha8Rng",
        scenario: scenario.name.clone(),
        n_runs_per_cell: cli.runs,
        duration: cli.duration,
        cells,
    };

    let dir = std::path::Path::new("sweep-results");
    if !dir.exists() {
        std::fs::create_dir_all(dir).expect("Failed to create sweep-results/");
    }
    let path = dir.join(format!("sweep-{ts}.json"));
    let json = serde_json::to_string_pretty(&report).expect("Failed to serialize");
    std::fs::write(&path, &json).expect("Failed to write sweep report");
    println!("  Results saved to: {}\n", path.display());
}
