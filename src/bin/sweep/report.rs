// Sweep Report Types — structured output for fee-policy comparison
// One cell per (upfront_base_coeff, upfront_rate_coeff) grid point

use std::collections::BTreeMap;

use serde::Serialize;

// ─── Statistics (per-metric aggregation across seeded runs) ─────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── Per-workload summary ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct WorkloadSummary {
    pub n_runs: usize,
    pub num_sent: Stats,
    pub num_failed: Stats,
    pub num_reached_receiver: Stats,
    /// Mean revenue per node across runs, sats.
    pub mean_revenues: BTreeMap<String, f64>,
}

// ─── Grid cell ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SweepCell {
    pub upfront_base_coeff: f64,
    pub upfront_rate_coeff: f64,
    pub honest: WorkloadSummary,
    pub jamming: Option<WorkloadSummary>,
}

// ─── Top-level report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SweepReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub scenario: String,
    pub n_runs_per_cell: usize,
    pub duration: f64,
    pub cells: Vec<SweepCell>,
}
