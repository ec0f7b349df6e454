// Seeded run loop — N runs per workload per grid cell, aggregated
// Each run owns a fresh network-model state; seeds are base_seed..base+N

use std::collections::BTreeMap;

use gauntlet_engine::{
    GauntletSimulation, NetworkModel, RunResult, SimulationParams, Workload,
};
use num_traits::ToPrimitive;

use crate::report::{Stats, SweepCell, WorkloadSummary};
use crate::scenarios::Scenario;

/// Execute one workload once under one seed.
fn run_single(
    scenario: &Scenario,
    params: &SimulationParams,
    workload: &Workload,
    seed: u64,
) -> RunResult {
    let net = NetworkModel::from_specs(&scenario.specs, params)
        .expect("scenario specs validated at load time");
    let mut sim = GauntletSimulation::new(net, params.clone(), seed);
    sim.run(workload).expect("workload nodes validated at load time")
}

/// Aggregate per-run results into counter stats and mean revenues.
fn summarize(results: &[RunResult]) -> WorkloadSummary {
    let num_sent = Stats::from_samples(
        &results.iter().map(|r| r.stats.num_sent as f64).collect::<Vec<_>>(),
    );
    let num_failed = Stats::from_samples(
        &results.iter().map(|r| r.stats.num_failed as f64).collect::<Vec<_>>(),
    );
    let num_reached_receiver = Stats::from_samples(
        &results.iter().map(|r| r.stats.num_reached_receiver as f64).collect::<Vec<_>>(),
    );

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for result in results {
        for (node, revenue) in &result.revenues {
            *totals.entry(node.0.clone()).or_insert(0.0) +=
                revenue.0.to_f64().unwrap_or(0.0);
        }
    }
    let n = results.len().max(1) as f64;
    let mean_revenues = totals.into_iter().map(|(node, sum)| (node, sum / n)).collect();

    WorkloadSummary {
        n_runs: results.len(),
        num_sent,
        num_failed,
        num_reached_receiver,
        mean_revenues,
    }
}

/// Run one grid cell: the honest workload and, when the scenario defines
/// an attack, the jamming workload, `n_runs` seeds each.
pub fn run_cell(
    scenario: &Scenario,
    base_params: &SimulationParams,
    upfront_base_coeff: f64,
    upfront_rate_coeff: f64,
    n_runs: usize,
    base_seed: u64,
) -> SweepCell {
    let mut params = base_params.clone();
    params.upfront_base_coeff = rust_decimal::Decimal::from_f64_retain(upfront_base_coeff)
        .unwrap_or_default();
    params.upfront_rate_coeff = rust_decimal::Decimal::from_f64_retain(upfront_rate_coeff)
        .unwrap_or_default();

    let honest_results: Vec<RunResult> = (0..n_runs)
        .map(|i| run_single(scenario, &params, &scenario.honest, base_seed + i as u64))
        .collect();

    let jamming = scenario.attack.as_ref().map(|attack| {
        let workload = Workload::Jamming(attack.clone());
        let results: Vec<RunResult> = (0..n_runs)
            .map(|i| run_single(scenario, &params, &workload, base_seed + i as u64))
            .collect();
        summarize(&results)
    });

    SweepCell {
        upfront_base_coeff,
        upfront_rate_coeff,
        honest: summarize(&honest_results),
        jamming,
    }
}
