// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet") - Simulation Core

//! The event loop and forwarding state machine.
//!
//! One `GauntletSimulation` owns the mutable state of exactly one run:
//! channel queues, the revenue ledger, the clock, and the RNG. Between
//! runs everything is reset; topology and fee coefficients are reusable
//! read-only inputs. Simulated time is logical and advances only when an
//! event is popped.

use std::collections::{BTreeMap, HashSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::channel::Htlc;
use crate::ledger::RevenueLedger;
use crate::network::NetworkModel;
use crate::params::SimulationParams;
use crate::payment::{build_payment, Payment};
use crate::router::{HonestRoutes, JammingRoutes, TargetPair};
use crate::schedule::{honest_schedule, jam_event, jamming_schedule, Event, Schedule};
use crate::types::{ForwardFailure, NodeId, Sats};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal simulation errors. Forwarding failures never surface here; they
/// are consumed by the retry machinery.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("unknown node id: {0}")]
    UnknownNode(NodeId),
}

// ---------------------------------------------------------------------------
// Workloads & results
// ---------------------------------------------------------------------------

/// Attack description for the jamming workload.
#[derive(Debug, Clone)]
pub struct JammingAttack {
    pub sender: NodeId,
    pub receiver: NodeId,
    /// Directed hops the attacker wants rendered unusable.
    pub target_pairs: Vec<TargetPair>,
}

/// Which workload a run executes.
#[derive(Debug, Clone)]
pub enum Workload {
    Honest { senders: Vec<NodeId>, receivers: Vec<NodeId> },
    Jamming(JammingAttack),
}

/// Aggregate counters of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Forwarding attempts launched.
    pub num_sent: u64,
    /// Attempts that failed at some hop.
    pub num_failed: u64,
    /// Attempts that traversed the full route.
    pub num_reached_receiver: u64,
}

/// Result object of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub stats: RunStats,
    pub revenues: BTreeMap<NodeId, Sats>,
}

// ---------------------------------------------------------------------------
// GauntletSimulation
// ---------------------------------------------------------------------------

pub struct GauntletSimulation {
    net: NetworkModel,
    params: SimulationParams,
    ledger: RevenueLedger,
    rng: ChaCha8Rng,
    seed: u64,
    now: f64,
    stats: RunStats,
}

impl GauntletSimulation {
    pub fn new(net: NetworkModel, params: SimulationParams, seed: u64) -> Self {
        Self {
            net,
            params,
            ledger: RevenueLedger::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            now: 0.0,
            stats: RunStats::default(),
        }
    }

    pub fn network(&self) -> &NetworkModel {
        &self.net
    }

    pub fn ledger(&self) -> &RevenueLedger {
        &self.ledger
    }

    /// Reset queues, ledger, clock, counters, and reseed the RNG, making
    /// repeated runs on one instance bit-identical.
    pub fn reset(&mut self) {
        self.net.reset_runtime_state();
        self.ledger.reset();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.now = 0.0;
        self.stats = RunStats::default();
    }

    /// Execute one full run of `workload`: reset, populate the schedule,
    /// drive the main loop, drain, and report.
    pub fn run(&mut self, workload: &Workload) -> Result<RunResult, SimulationError> {
        self.reset();
        match workload {
            Workload::Honest { senders, receivers } => {
                for node in senders.iter().chain(receivers) {
                    self.require_node(node)?;
                }
                let schedule =
                    honest_schedule(&mut self.rng, &self.params, senders, receivers);
                self.run_loop(schedule, None)
            }
            Workload::Jamming(attack) => {
                self.require_node(&attack.sender)?;
                self.require_node(&attack.receiver)?;
                for (from, to) in &attack.target_pairs {
                    self.require_node(from)?;
                    self.require_node(to)?;
                }
                let schedule =
                    jamming_schedule(&self.params, attack.sender.clone(), attack.receiver.clone());
                self.run_loop(schedule, Some(attack))
            }
        }
    }

    /// Drive a caller-supplied honest schedule (already reset).
    pub fn run_honest_schedule(
        &mut self,
        schedule: Schedule,
    ) -> Result<RunResult, SimulationError> {
        self.reset();
        self.run_loop(schedule, None)
    }

    /// Drive a caller-supplied jamming schedule for `attack`.
    pub fn run_jamming_schedule(
        &mut self,
        schedule: Schedule,
        attack: &JammingAttack,
    ) -> Result<RunResult, SimulationError> {
        self.reset();
        self.run_loop(schedule, Some(attack))
    }

    fn require_node(&self, node: &NodeId) -> Result<(), SimulationError> {
        if self.net.contains_node(node) {
            Ok(())
        } else {
            Err(SimulationError::UnknownNode(node.clone()))
        }
    }

    // -- main loop ----------------------------------------------------------

    fn run_loop(
        &mut self,
        mut schedule: Schedule,
        attack: Option<&JammingAttack>,
    ) -> Result<RunResult, SimulationError> {
        while let Some(event) = schedule.pop_earliest() {
            if event.time > schedule.end_time() {
                break;
            }
            self.now = event.time;
            match attack {
                None => self.process_honest_event(&event)?,
                Some(attack) => self.process_jam_event(&event, attack, &mut schedule),
            }
        }
        self.drain();
        log::info!(
            "run finished: sent={} reached={} failed={}",
            self.stats.num_sent,
            self.stats.num_reached_receiver,
            self.stats.num_failed
        );
        Ok(RunResult { stats: self.stats.clone(), revenues: self.ledger.snapshot() })
    }

    /// One honest event. The terminal forwarding failure is consumed
    /// here; it ends the event and never escapes the run.
    fn process_honest_event(&mut self, event: &Event) -> Result<(), SimulationError> {
        for via in &event.must_route_via {
            self.require_node(via)?;
        }
        if let Err(failure) = self.try_honest_event(event) {
            log::debug!("t={:.3}: honest event abandoned: {failure}", self.now);
        }
        Ok(())
    }

    /// Walk route candidates: replace the route on a jam, retry it on a
    /// balance failure, stop at the first delivery. Fails with `NoRoute`
    /// when the enumerator yields nothing at all, otherwise with the last
    /// forwarding failure once routes and attempts are exhausted.
    fn try_honest_event(&mut self, event: &Event) -> Result<(), ForwardFailure> {
        let mut routes =
            HonestRoutes::new(&event.sender, &event.receiver, event.amount, &event.must_route_via);
        let mut last_failure = None;

        for _ in 0..self.params.max_num_routes_honest {
            let Some(route) = routes.next_route(&self.net) else {
                break;
            };
            let payment = match build_payment(&self.net, &route, event) {
                Ok(payment) => payment,
                Err(failure) => {
                    last_failure = Some(failure);
                    continue;
                }
            };

            for _ in 0..self.params.max_num_attempts_per_route_honest {
                self.stats.num_sent += 1;
                match self.forward(&payment) {
                    Ok(()) => {
                        self.stats.num_reached_receiver += 1;
                        return Ok(());
                    }
                    Err(failure @ ForwardFailure::BalanceFailure { .. }) => {
                        self.stats.num_failed += 1;
                        last_failure = Some(failure);
                    }
                    Err(failure) => {
                        self.stats.num_failed += 1;
                        last_failure = Some(failure);
                        break;
                    }
                }
            }
        }

        Err(last_failure.unwrap_or_else(|| ForwardFailure::NoRoute {
            sender: event.sender.clone(),
            receiver: event.receiver.clone(),
        }))
    }

    /// One jamming batch: pull routes until every target has been observed
    /// jammed or the enumeration is exhausted, then book the next batch.
    fn process_jam_event(
        &mut self,
        event: &Event,
        attack: &JammingAttack,
        schedule: &mut Schedule,
    ) {
        let mut unjammed: HashSet<TargetPair> =
            attack.target_pairs.iter().cloned().collect();
        let had_targets = !unjammed.is_empty();
        let mut routes = JammingRoutes::new(
            attack.target_pairs.clone(),
            event.sender.clone(),
            event.receiver.clone(),
            event.amount,
            self.params.max_target_pairs_per_route,
        );

        while !unjammed.is_empty() {
            let Some(route) = routes.next_route(&self.net, &unjammed) else {
                let failure = ForwardFailure::NoRoute {
                    sender: event.sender.clone(),
                    receiver: event.receiver.clone(),
                };
                log::debug!(
                    "t={:.3}: batch ends with {} targets unjammed: {failure}",
                    self.now,
                    unjammed.len()
                );
                break;
            };
            let payment = match build_payment(&self.net, &route, event) {
                Ok(payment) => payment,
                Err(_) => continue,
            };

            // Successive attempts occupy one more slot per traversed
            // direction; the first jam observed on this route ends it.
            for _ in 0..self.params.max_num_attempts_per_route_jamming {
                self.stats.num_sent += 1;
                match self.forward(&payment) {
                    Ok(()) => {
                        self.stats.num_reached_receiver += 1;
                    }
                    Err(ForwardFailure::SlotsJammed { at_hop }) => {
                        self.stats.num_failed += 1;
                        let pair = (route[at_hop].clone(), route[at_hop + 1].clone());
                        if unjammed.remove(&pair) {
                            log::debug!(
                                "t={:.3}: target ({},{}) jammed",
                                self.now,
                                pair.0,
                                pair.1
                            );
                        }
                        break;
                    }
                    Err(_) => {
                        self.stats.num_failed += 1;
                        break;
                    }
                }
            }
        }

        if had_targets {
            let next_time = self.now + self.params.jam_delay;
            if next_time <= schedule.end_time() {
                schedule.push(jam_event(
                    next_time,
                    event.sender.clone(),
                    event.receiver.clone(),
                    &self.params,
                ));
            }
        }
    }

    // -- forwarding ---------------------------------------------------------

    /// Drive a payment hop by hop. Unconditional fees are paid at entry
    /// into each hop up to and including the failing one; hops beyond the
    /// failure point neither insert HTLCs nor pay upfront fees.
    fn forward(&mut self, payment: &Payment) -> Result<(), ForwardFailure> {
        debug_assert!(payment.processing_delay > 0.0);

        for (idx, hop) in payment.hops.iter().enumerate() {
            if self
                .net
                .direction_mut(&hop.upstream, &hop.downstream, &hop.cid)
                .is_none()
            {
                return Err(ForwardFailure::NoCapableChannel {
                    at_hop: idx,
                    from: hop.upstream.clone(),
                    to: hop.downstream.clone(),
                });
            }

            if !hop.upfront_fee.is_zero() {
                self.ledger.transfer(&hop.upstream, &hop.downstream, hop.upfront_fee);
            }

            if payment.desired_result
                && !self.params.no_balance_failures
                && self.rng.gen::<f64>() < self.params.balance_failure_rate
            {
                return Err(ForwardFailure::BalanceFailure { at_hop: idx });
            }

            let now = self.now;
            let state = self
                .net
                .direction_mut(&hop.upstream, &hop.downstream, &hop.cid)
                .expect("direction checked above");

            // Lazy resolution: a full queue may still hold an obligation
            // whose time has come; pop exactly one to win the slot.
            let resolved = if state.has_free_slot() {
                None
            } else {
                let due = state
                    .peek_earliest()
                    .map(|earliest| earliest.resolution_time <= now)
                    .unwrap_or(false);
                if !due {
                    return Err(ForwardFailure::SlotsJammed { at_hop: idx });
                }
                state.pop_earliest()
            };

            state
                .try_insert(Htlc {
                    resolution_time: now + payment.processing_delay,
                    desired_result: payment.desired_result,
                    success_fee: hop.success_fee,
                    upstream: hop.upstream.clone(),
                    downstream: hop.downstream.clone(),
                })
                .expect("a slot is free after lazy resolution");

            if let Some(htlc) = resolved {
                self.apply_resolution(&htlc);
            }
        }
        Ok(())
    }

    /// Resolve one obligation against the ledger. Only a settled payment
    /// moves its success fee; a failed one moves nothing.
    fn apply_resolution(&mut self, htlc: &Htlc) {
        if htlc.desired_result {
            self.ledger.transfer(&htlc.upstream, &htlc.downstream, htlc.success_fee);
        }
    }

    /// End-of-run pass: resolve every remaining in-flight obligation
    /// against its own resolution time.
    fn drain(&mut self) {
        let mut remaining: Vec<Htlc> = Vec::new();
        self.net.for_each_direction_mut(|_, _, _, state| {
            while let Some(htlc) = state.pop_earliest() {
                remaining.push(htlc);
            }
        });
        for htlc in &remaining {
            self.apply_resolution(htlc);
        }
        log::debug!("drain: {} in-flight obligations resolved", remaining.len());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ChannelSpec;
    use crate::types::ChannelId;
    use rust_decimal::Decimal;

    fn spec(source: &str, destination: &str, cid: &str, base_sat: u64) -> ChannelSpec {
        ChannelSpec {
            source: NodeId::from(source),
            destination: NodeId::from(destination),
            cid: ChannelId::from(cid),
            capacity: Sats::from_sat(1_000_000),
            base_success: Sats::from_sat(base_sat),
            rate_success: Decimal::ZERO,
        }
    }

    fn both_ways(a: &str, b: &str, cid: &str, base_sat: u64) -> [ChannelSpec; 2] {
        [spec(a, b, cid, base_sat), spec(b, a, cid, base_sat)]
    }

    fn node(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn unknown_workload_node_is_fatal() {
        let specs = both_ways("alice", "bob", "1x0x0", 1);
        let net = NetworkModel::from_specs(&specs, &SimulationParams::default()).unwrap();
        let mut sim = GauntletSimulation::new(net, SimulationParams::default(), 0);

        let err = sim
            .run(&Workload::Honest {
                senders: vec![node("alice")],
                receivers: vec![node("ghost")],
            })
            .expect_err("test: unknown receiver candidate");
        assert!(matches!(err, SimulationError::UnknownNode(n) if n == node("ghost")));
    }

    #[test]
    fn unknown_must_route_via_is_fatal() {
        let specs = both_ways("alice", "bob", "1x0x0", 1);
        let net = NetworkModel::from_specs(&specs, &SimulationParams::default()).unwrap();
        let params = SimulationParams { duration: 10.0, ..Default::default() };
        let mut sim = GauntletSimulation::new(net, params, 0);

        let mut schedule = Schedule::new(10.0);
        schedule.push(Event {
            time: 0.0,
            sender: node("alice"),
            receiver: node("bob"),
            amount: Sats::from_sat(100),
            desired_result: true,
            processing_delay: 1.0,
            must_route_via: vec![node("ghost")],
        });
        let err = sim
            .run_honest_schedule(schedule)
            .expect_err("test: unknown via node");
        assert!(matches!(err, SimulationError::UnknownNode(_)));
    }

    #[test]
    fn events_past_end_time_never_execute() {
        let specs = both_ways("alice", "bob", "1x0x0", 1);
        let net = NetworkModel::from_specs(&specs, &SimulationParams::default()).unwrap();
        let params = SimulationParams { no_balance_failures: true, ..Default::default() };
        let mut sim = GauntletSimulation::new(net, params, 0);

        let mut schedule = Schedule::new(5.0);
        schedule.push(Event {
            time: 6.0,
            sender: node("alice"),
            receiver: node("bob"),
            amount: Sats::from_sat(100),
            desired_result: true,
            processing_delay: 1.0,
            must_route_via: Vec::new(),
        });
        let result = sim.run_honest_schedule(schedule).expect("test: run");
        assert_eq!(result.stats, RunStats::default());
        assert!(result.revenues.is_empty());
    }

    #[test]
    fn disconnected_receiver_abandons_the_event() {
        // Two components: alice-bob and carol-dave. Both endpoints exist,
        // but no route connects them.
        let mut specs = Vec::new();
        specs.extend(both_ways("alice", "bob", "1x0x0", 1));
        specs.extend(both_ways("carol", "dave", "2x0x0", 1));
        let net = NetworkModel::from_specs(&specs, &SimulationParams::default()).unwrap();
        let params = SimulationParams { no_balance_failures: true, ..Default::default() };
        let mut sim = GauntletSimulation::new(net, params, 0);

        let mut schedule = Schedule::new(10.0);
        schedule.push(Event {
            time: 0.0,
            sender: node("alice"),
            receiver: node("carol"),
            amount: Sats::from_sat(100),
            desired_result: true,
            processing_delay: 1.0,
            must_route_via: Vec::new(),
        });
        let result = sim.run_honest_schedule(schedule).expect("test: run");
        // The event is abandoned with no attempt launched and no fees paid.
        assert_eq!(result.stats, RunStats::default());
        assert!(result.revenues.is_empty());
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let mut specs = Vec::new();
        specs.extend(both_ways("alice", "bob", "1x0x0", 2));
        specs.extend(both_ways("bob", "carol", "2x0x0", 3));
        let params = SimulationParams { duration: 15.0, ..Default::default() };
        let net = NetworkModel::from_specs(&specs, &params).unwrap();
        let workload = Workload::Honest {
            senders: vec![node("alice"), node("carol")],
            receivers: vec![node("alice"), node("bob"), node("carol")],
        };

        let mut sim = GauntletSimulation::new(net, params, 99);
        let first = sim.run(&workload).expect("test: first run");
        let second = sim.run(&workload).expect("test: second run");
        assert_eq!(first.stats, second.stats);
        assert_eq!(first.revenues, second.revenues);
    }

    #[test]
    fn ledger_sums_to_zero_under_load() {
        use rust_decimal_macros::dec;
        let mut specs = Vec::new();
        specs.extend(both_ways("alice", "bob", "1x0x0", 2));
        specs.extend(both_ways("bob", "carol", "2x0x0", 3));
        let params = SimulationParams {
            duration: 15.0,
            upfront_base_coeff: dec!(0.5),
            upfront_rate_coeff: dec!(0.5),
            ..Default::default()
        };
        let net = NetworkModel::from_specs(&specs, &params).unwrap();
        let mut sim = GauntletSimulation::new(net, params, 3);
        let result = sim
            .run(&Workload::Honest {
                senders: vec![node("alice")],
                receivers: vec![node("carol")],
            })
            .expect("test: run");

        assert!(sim.ledger().total().is_zero(), "ledger must sum to zero");
        assert!(result.stats.num_sent > 0);
    }
}
