// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet") - Event Schedule

//! The time-ordered event queue and its workload generators.
//!
//! Honest schedules are drawn up-front from a seeded RNG; jamming
//! schedules start with a single seed event and grow dynamically as the
//! engine pushes successor batches.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::params::SimulationParams;
use crate::types::{NodeId, Sats};

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A pending payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time: f64,
    pub sender: NodeId,
    pub receiver: NodeId,
    /// Body delivered to the receiver, in sats.
    pub amount: Sats,
    /// Whether the receiver settles the payment once it arrives.
    pub desired_result: bool,
    /// Per-hop HTLC lifetime, seconds.
    pub processing_delay: f64,
    /// Nodes the route must visit, in order. Empty means unconstrained.
    pub must_route_via: Vec<NodeId>,
}

/// Heap entry: earliest time first, FIFO within equal timestamps.
#[derive(Debug, Clone)]
struct QueuedEvent {
    event: Event,
    seq: u64,
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .event
            .time
            .total_cmp(&self.event.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.event.time == other.event.time && self.seq == other.seq
    }
}

impl Eq for QueuedEvent {}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Min-heap of events keyed by time, with an end time distinct from the
/// last event's timestamp.
#[derive(Debug, Clone)]
pub struct Schedule {
    heap: BinaryHeap<QueuedEvent>,
    next_seq: u64,
    end_time: f64,
}

impl Schedule {
    pub fn new(end_time: f64) -> Self {
        Self { heap: BinaryHeap::new(), next_seq: 0, end_time }
    }

    pub fn push(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedEvent { event, seq });
    }

    pub fn pop_earliest(&mut self) -> Option<Event> {
        self.heap.pop().map(|q| q.event)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Inverse-transform exponential sample with the given mean.
fn sample_exp(rng: &mut ChaCha8Rng, mean: f64) -> f64 {
    let u: f64 = rng.gen();
    -mean * (1.0 - u).ln()
}

/// Populate an honest workload: exponential inter-arrivals, uniform
/// amounts, shifted-exponential processing delays, endpoints drawn
/// uniformly from the candidate sets. Generation stops at the first
/// arrival past `duration`.
pub fn honest_schedule(
    rng: &mut ChaCha8Rng,
    params: &SimulationParams,
    senders: &[NodeId],
    receivers: &[NodeId],
) -> Schedule {
    let mut schedule = Schedule::new(params.duration);
    if senders.is_empty() || receivers.is_empty() {
        return schedule;
    }

    let mean_interval = 1.0 / params.honest_payments_per_second;
    let (amount_lo, amount_hi) = params.honest_amount_range;
    let mut t = 0.0;

    loop {
        t += sample_exp(rng, mean_interval);
        if t > params.duration {
            break;
        }
        let amount = Sats::from_sat(rng.gen_range(amount_lo..=amount_hi));
        let processing_delay = params.min_processing_delay
            + sample_exp(rng, params.expected_extra_processing_delay);
        let sender = senders[rng.gen_range(0..senders.len())].clone();
        let candidates: Vec<&NodeId> = receivers.iter().filter(|r| **r != sender).collect();
        if candidates.is_empty() {
            continue;
        }
        let receiver = candidates[rng.gen_range(0..candidates.len())].clone();

        schedule.push(Event {
            time: t,
            sender,
            receiver,
            amount,
            desired_result: true,
            processing_delay,
            must_route_via: Vec::new(),
        });
    }
    schedule
}

/// The jam event fired at `time`. The engine re-issues this with advanced
/// timestamps after each batch.
pub fn jam_event(time: f64, sender: NodeId, receiver: NodeId, params: &SimulationParams) -> Event {
    Event {
        time,
        sender,
        receiver,
        amount: Sats::from_sat(params.dust_limit),
        desired_result: false,
        processing_delay: params.jam_delay,
        must_route_via: Vec::new(),
    }
}

/// Populate a jamming workload: a single seed event at `t = 0`.
pub fn jamming_schedule(
    params: &SimulationParams,
    sender: NodeId,
    receiver: NodeId,
) -> Schedule {
    let mut schedule = Schedule::new(params.duration);
    schedule.push(jam_event(0.0, sender, receiver, params));
    schedule
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn event_at(time: f64, tag: u64) -> Event {
        Event {
            time,
            sender: NodeId::from("a"),
            receiver: NodeId::from("b"),
            amount: Sats::from_sat(tag),
            desired_result: true,
            processing_delay: 1.0,
            must_route_via: Vec::new(),
        }
    }

    #[test]
    fn pops_in_time_order_fifo_on_ties() {
        let mut schedule = Schedule::new(100.0);
        schedule.push(event_at(5.0, 1));
        schedule.push(event_at(3.0, 2));
        schedule.push(event_at(3.0, 3));
        schedule.push(event_at(3.0, 4));

        assert_eq!(schedule.pop_earliest().unwrap().amount, Sats::from_sat(2));
        assert_eq!(schedule.pop_earliest().unwrap().amount, Sats::from_sat(3));
        assert_eq!(schedule.pop_earliest().unwrap().amount, Sats::from_sat(4));
        assert_eq!(schedule.pop_earliest().unwrap().amount, Sats::from_sat(1));
        assert!(schedule.is_empty());
    }

    #[test]
    fn honest_schedule_is_deterministic() {
        let params = SimulationParams { duration: 20.0, ..Default::default() };
        let senders = vec![NodeId::from("a"), NodeId::from("b")];
        let receivers = vec![NodeId::from("b"), NodeId::from("c")];

        let mut rng1 = ChaCha8Rng::seed_from_u64(7);
        let mut rng2 = ChaCha8Rng::seed_from_u64(7);
        let mut s1 = honest_schedule(&mut rng1, &params, &senders, &receivers);
        let mut s2 = honest_schedule(&mut rng2, &params, &senders, &receivers);

        assert_eq!(s1.len(), s2.len());
        while let (Some(a), Some(b)) = (s1.pop_earliest(), s2.pop_earliest()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn honest_schedule_respects_bounds() {
        let params = SimulationParams {
            duration: 50.0,
            honest_amount_range: (100, 200),
            min_processing_delay: 1.0,
            ..Default::default()
        };
        let senders = vec![NodeId::from("a")];
        let receivers = vec![NodeId::from("a"), NodeId::from("b")];

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut schedule = honest_schedule(&mut rng, &params, &senders, &receivers);
        assert!(schedule.len() > 0, "50s at 10/s should yield events");

        while let Some(event) = schedule.pop_earliest() {
            assert!(event.time <= 50.0);
            assert!(event.amount >= Sats::from_sat(100) && event.amount <= Sats::from_sat(200));
            assert!(event.processing_delay >= 1.0, "delay never drops below the floor");
            assert!(event.desired_result);
            // The sender can never be picked as its own receiver.
            assert_eq!(event.receiver, NodeId::from("b"));
        }
    }

    #[test]
    fn jamming_schedule_seeds_one_event() {
        let params = SimulationParams::default();
        let mut schedule =
            jamming_schedule(&params, NodeId::from("atk-send"), NodeId::from("atk-recv"));
        assert_eq!(schedule.len(), 1);
        let seed = schedule.pop_earliest().unwrap();
        assert_eq!(seed.time, 0.0);
        assert_eq!(seed.amount, Sats::from_sat(params.dust_limit));
        assert!(!seed.desired_result);
        assert_eq!(seed.processing_delay, params.jam_delay);
    }
}
