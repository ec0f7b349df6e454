// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet") - Parameters

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration record consumed by schedule generation, model
/// construction, and the engine. One instance is shared by every run of a
/// sweep cell; the upfront coefficients are what the sweep varies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Slot budget applied to every channel direction.
    pub default_num_slots: usize,
    /// Body of every jam payment, in sats.
    pub dust_limit: u64,

    /// Mean honest arrival rate (exponential inter-arrival times).
    pub honest_payments_per_second: f64,
    /// Uniform honest amount range in sats, inclusive lower bound.
    pub honest_amount_range: (u64, u64),
    /// Floor on per-payment processing delay, seconds. Must be positive.
    pub min_processing_delay: f64,
    /// Mean of the exponential extra delay added on top of the floor.
    pub expected_extra_processing_delay: f64,

    /// Processing delay of jam payments and spacing between jam batches.
    pub jam_delay: f64,

    /// Route candidates tried per honest event.
    pub max_num_routes_honest: usize,
    /// Forwarding attempts per honest route.
    pub max_num_attempts_per_route_honest: u32,
    /// Forwarding attempts per jamming route.
    pub max_num_attempts_per_route_jamming: u32,
    /// Largest target-pair subset threaded through a single jam route.
    pub max_target_pairs_per_route: usize,

    /// Simulation end time, seconds.
    pub duration: f64,

    /// When true, hops never reject honest payments probabilistically.
    pub no_balance_failures: bool,
    /// Per-hop rejection probability for honest payments.
    pub balance_failure_rate: f64,

    /// Multiplier of `base_success` yielding `base_upfront`.
    pub upfront_base_coeff: Decimal,
    /// Multiplier of `rate_success` yielding `rate_upfront`.
    pub upfront_rate_coeff: Decimal,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            default_num_slots: 483,
            dust_limit: 354,
            honest_payments_per_second: 10.0,
            honest_amount_range: (10_000, 100_000),
            min_processing_delay: 1.0,
            expected_extra_processing_delay: 3.0,
            jam_delay: 7.0,
            max_num_routes_honest: 10,
            max_num_attempts_per_route_honest: 10,
            max_num_attempts_per_route_jamming: 500,
            max_target_pairs_per_route: 5,
            duration: 30.0,
            no_balance_failures: false,
            balance_failure_rate: 0.05,
            upfront_base_coeff: Decimal::ZERO,
            upfront_rate_coeff: Decimal::ZERO,
        }
    }
}

impl SimulationParams {
    /// Whether the configured upfront multipliers levy any fee at all.
    pub fn has_upfront_coeffs(&self) -> bool {
        !self.upfront_base_coeff.is_zero() || !self.upfront_rate_coeff.is_zero()
    }
}
