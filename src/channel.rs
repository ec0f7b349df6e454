// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet") - Channels & Slot Queues

//! Directional channel state and the in-flight HTLC machinery.
//!
//! Each enabled channel direction owns a priority queue of outstanding
//! obligations bounded by its slot budget. Resolution is lazy: an HTLC
//! stays queued past its resolution time until a later forward through the
//! same direction (or the end-of-run drain) pops it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rust_decimal::Decimal;

use crate::types::{ChannelId, Direction, NodeId, Sats};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Insertion into a directional queue with no free slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("all {0} slots occupied")]
pub struct SlotsFull(pub usize);

// ---------------------------------------------------------------------------
// Htlc
// ---------------------------------------------------------------------------

/// An in-flight conditional payment obligation. Immutable after insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Htlc {
    /// Absolute simulated time at which this obligation resolves.
    pub resolution_time: f64,
    /// Whether the receiver settles (`true`) or fails (`false`) the payment.
    pub desired_result: bool,
    /// Success fee transferred upstream -> downstream on settlement.
    pub success_fee: Sats,
    pub upstream: NodeId,
    pub downstream: NodeId,
}

/// Heap entry: earliest resolution first, insertion order within ties.
///
/// `BinaryHeap` is a max-heap, so the ordering is reversed here.
#[derive(Debug, Clone)]
struct QueuedHtlc {
    htlc: Htlc,
    seq: u64,
}

impl Ord for QueuedHtlc {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .htlc
            .resolution_time
            .total_cmp(&self.htlc.resolution_time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedHtlc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedHtlc {
    fn eq(&self, other: &Self) -> bool {
        self.htlc.resolution_time == other.htlc.resolution_time && self.seq == other.seq
    }
}

impl Eq for QueuedHtlc {}

// ---------------------------------------------------------------------------
// ChannelDirection
// ---------------------------------------------------------------------------

/// Per-direction fee coefficients and the bounded in-flight queue.
#[derive(Debug, Clone)]
pub struct ChannelDirection {
    /// Flat success-case fee in sats.
    pub base_success: Sats,
    /// Proportional success-case fee per sat of body.
    pub rate_success: Decimal,
    /// Flat unconditional fee in sats.
    pub base_upfront: Sats,
    /// Proportional unconditional fee per sat of amount.
    pub rate_upfront: Decimal,
    /// Slot budget: the queue never exceeds this size.
    pub num_slots: usize,
    htlcs: BinaryHeap<QueuedHtlc>,
    next_seq: u64,
}

impl ChannelDirection {
    pub fn new(
        base_success: Sats,
        rate_success: Decimal,
        base_upfront: Sats,
        rate_upfront: Decimal,
        num_slots: usize,
    ) -> Self {
        Self {
            base_success,
            rate_success,
            base_upfront,
            rate_upfront,
            num_slots,
            htlcs: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn has_free_slot(&self) -> bool {
        self.htlcs.len() < self.num_slots
    }

    /// Queue an obligation. Requires a free slot.
    pub fn try_insert(&mut self, htlc: Htlc) -> Result<(), SlotsFull> {
        if !self.has_free_slot() {
            return Err(SlotsFull(self.num_slots));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.htlcs.push(QueuedHtlc { htlc, seq });
        Ok(())
    }

    /// The obligation with the earliest resolution time, if any.
    pub fn peek_earliest(&self) -> Option<&Htlc> {
        self.htlcs.peek().map(|q| &q.htlc)
    }

    pub fn pop_earliest(&mut self) -> Option<Htlc> {
        self.htlcs.pop().map(|q| q.htlc)
    }

    pub fn len(&self) -> usize {
        self.htlcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.htlcs.is_empty()
    }

    /// Jammed at time `now`: every slot occupied and even the earliest
    /// obligation resolves strictly in the future.
    pub fn is_jammed(&self, now: f64) -> bool {
        !self.has_free_slot()
            && self
                .peek_earliest()
                .map(|h| h.resolution_time > now)
                .unwrap_or(false)
    }

    /// `base_success + rate_success * body`
    pub fn success_fee(&self, body: Sats) -> Sats {
        self.base_success + Sats(self.rate_success * body.0)
    }

    /// `base_upfront + rate_upfront * amount`
    pub fn upfront_fee(&self, amount: Sats) -> Sats {
        self.base_upfront + Sats(self.rate_upfront * amount.0)
    }

    /// Fee pair for forwarding `body` downstream as part of `amount`.
    pub fn compute_fees(&self, body: Sats, amount: Sats) -> (Sats, Sats) {
        (self.success_fee(body), self.upfront_fee(amount))
    }

    /// Whether this direction levies unconditional fees at all.
    pub fn has_upfront_fees(&self) -> bool {
        !self.base_upfront.is_zero() || !self.rate_upfront.is_zero()
    }

    /// Drop all queued obligations (between runs).
    pub fn reset(&mut self) {
        self.htlcs.clear();
        self.next_seq = 0;
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A physical channel between an unordered node pair.
///
/// Directional state is present only for enabled directions.
#[derive(Debug, Clone)]
pub struct Channel {
    pub cid: ChannelId,
    pub capacity: Sats,
    directions: [Option<ChannelDirection>; 2],
}

impl Channel {
    pub fn new(cid: ChannelId, capacity: Sats) -> Self {
        Self { cid, capacity, directions: [None, None] }
    }

    pub fn enable(&mut self, direction: Direction, state: ChannelDirection) {
        self.directions[direction.index()] = Some(state);
    }

    pub fn direction(&self, direction: Direction) -> Option<&ChannelDirection> {
        self.directions[direction.index()].as_ref()
    }

    pub fn direction_mut(&mut self, direction: Direction) -> Option<&mut ChannelDirection> {
        self.directions[direction.index()].as_mut()
    }

    pub fn is_enabled(&self, direction: Direction) -> bool {
        self.directions[direction.index()].is_some()
    }
}

// ---------------------------------------------------------------------------
// Hop
// ---------------------------------------------------------------------------

/// A channel chosen for one hop, with the fees it would charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelChoice {
    pub cid: ChannelId,
    /// Amount forwarded across this hop: downstream amount plus success fee.
    pub amount: Sats,
    pub success_fee: Sats,
    pub upfront_fee: Sats,
}

/// The set of parallel channels between an unordered node pair.
#[derive(Debug, Clone)]
pub struct Hop {
    /// Endpoints in identifier order.
    pub endpoints: (NodeId, NodeId),
    channels: Vec<Channel>,
}

impl Hop {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        let endpoints = if a < b { (a, b) } else { (b, a) };
        Self { endpoints, channels: Vec::new() }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }

    pub fn push_channel(&mut self, channel: Channel) {
        self.channels.push(channel);
        // Stable cid order keeps enumeration and tie-breaks deterministic.
        self.channels.sort_by(|a, b| a.cid.cmp(&b.cid));
    }

    pub fn channel_mut(&mut self, cid: &ChannelId) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| &c.cid == cid)
    }

    /// Channels with `direction` enabled whose capacity covers what they
    /// would actually carry: `downstream_amount` plus their own success
    /// fee. A channel that fits the body but not the fee-inclusive amount
    /// does not qualify.
    pub fn suitable(
        &self,
        downstream_amount: Sats,
        direction: Direction,
    ) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(move |c| {
            c.direction(direction)
                .map(|state| {
                    c.capacity >= downstream_amount + state.success_fee(downstream_amount)
                })
                .unwrap_or(false)
        })
    }

    /// Cheapest qualifying channel for forwarding `downstream_amount` in
    /// `direction`: ascending by success fee plus unconditional fee, ties
    /// by channel id (channels are kept in cid order).
    pub fn cheapest(&self, downstream_amount: Sats, direction: Direction) -> Option<ChannelChoice> {
        self.suitable(downstream_amount, direction)
            .map(|c| {
                let state = c.direction(direction).expect("suitable() checked direction");
                let success_fee = state.success_fee(downstream_amount);
                let amount = downstream_amount + success_fee;
                let upfront_fee = state.upfront_fee(amount);
                ChannelChoice { cid: c.cid.clone(), amount, success_fee, upfront_fee }
            })
            .min_by(|a, b| {
                (a.success_fee + a.upfront_fee)
                    .cmp(&(b.success_fee + b.upfront_fee))
                    .then_with(|| a.cid.cmp(&b.cid))
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn htlc(t: f64, fee: u64) -> Htlc {
        Htlc {
            resolution_time: t,
            desired_result: true,
            success_fee: Sats::from_sat(fee),
            upstream: NodeId::from("a"),
            downstream: NodeId::from("b"),
        }
    }

    fn direction_with_slots(n: usize) -> ChannelDirection {
        ChannelDirection::new(Sats::from_sat(1), dec!(0.001), Sats::ZERO, Decimal::ZERO, n)
    }

    #[test]
    fn queue_respects_slot_budget() {
        let mut dir = direction_with_slots(2);
        dir.try_insert(htlc(5.0, 1)).expect("test: first slot");
        dir.try_insert(htlc(3.0, 2)).expect("test: second slot");
        assert!(!dir.has_free_slot());
        let err = dir.try_insert(htlc(4.0, 3));
        assert_eq!(err, Err(SlotsFull(2)));
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn pop_order_is_earliest_first() {
        let mut dir = direction_with_slots(4);
        dir.try_insert(htlc(5.0, 1)).unwrap();
        dir.try_insert(htlc(3.0, 2)).unwrap();
        dir.try_insert(htlc(9.0, 3)).unwrap();
        assert_eq!(dir.peek_earliest().unwrap().resolution_time, 3.0);
        assert_eq!(dir.pop_earliest().unwrap().success_fee, Sats::from_sat(2));
        assert_eq!(dir.pop_earliest().unwrap().success_fee, Sats::from_sat(1));
        assert_eq!(dir.pop_earliest().unwrap().success_fee, Sats::from_sat(3));
        assert!(dir.pop_earliest().is_none());
    }

    #[test]
    fn equal_resolution_times_pop_in_insertion_order() {
        let mut dir = direction_with_slots(3);
        dir.try_insert(htlc(7.0, 1)).unwrap();
        dir.try_insert(htlc(7.0, 2)).unwrap();
        dir.try_insert(htlc(7.0, 3)).unwrap();
        assert_eq!(dir.pop_earliest().unwrap().success_fee, Sats::from_sat(1));
        assert_eq!(dir.pop_earliest().unwrap().success_fee, Sats::from_sat(2));
        assert_eq!(dir.pop_earliest().unwrap().success_fee, Sats::from_sat(3));
    }

    #[test]
    fn jammed_requires_full_queue_and_future_resolution() {
        let mut dir = direction_with_slots(1);
        assert!(!dir.is_jammed(0.0), "empty queue is never jammed");
        dir.try_insert(htlc(7.0, 1)).unwrap();
        assert!(dir.is_jammed(0.0));
        // Once the earliest resolution is due, the direction is merely full.
        assert!(!dir.is_jammed(7.0));
        assert!(!dir.is_jammed(10.0));
    }

    #[test]
    fn fee_computation() {
        let dir = ChannelDirection::new(
            Sats::from_sat(1),
            dec!(0.002),
            Sats::from_sat(3),
            dec!(0.01),
            483,
        );
        let (success, upfront) =
            dir.compute_fees(Sats::from_sat(1000), Sats::from_sat(2000));
        assert_eq!(success, Sats::from_decimal(dec!(3)));
        assert_eq!(upfront, Sats::from_decimal(dec!(23)));
        assert!(dir.has_upfront_fees());
        assert!(!direction_with_slots(1).has_upfront_fees());
    }

    #[test]
    fn cheapest_prefers_lower_total_fee_then_cid() {
        let mut hop = Hop::new(NodeId::from("a"), NodeId::from("b"));

        let mut expensive = Channel::new(ChannelId::from("1x1x1"), Sats::from_sat(10_000));
        expensive.enable(
            Direction::Alph,
            ChannelDirection::new(Sats::from_sat(10), Decimal::ZERO, Sats::ZERO, Decimal::ZERO, 483),
        );
        let mut cheap = Channel::new(ChannelId::from("2x2x2"), Sats::from_sat(10_000));
        cheap.enable(
            Direction::Alph,
            ChannelDirection::new(Sats::from_sat(2), Decimal::ZERO, Sats::ZERO, Decimal::ZERO, 483),
        );
        hop.push_channel(expensive);
        hop.push_channel(cheap);

        let choice = hop
            .cheapest(Sats::from_sat(100), Direction::Alph)
            .expect("test: should find a channel");
        assert_eq!(choice.cid, ChannelId::from("2x2x2"));
        assert_eq!(choice.amount, Sats::from_sat(102));

        // Equal fees: lowest cid wins.
        let mut tie = Channel::new(ChannelId::from("0x0x0"), Sats::from_sat(10_000));
        tie.enable(
            Direction::Alph,
            ChannelDirection::new(Sats::from_sat(2), Decimal::ZERO, Sats::ZERO, Decimal::ZERO, 483),
        );
        hop.push_channel(tie);
        let choice = hop.cheapest(Sats::from_sat(100), Direction::Alph).unwrap();
        assert_eq!(choice.cid, ChannelId::from("0x0x0"));
    }

    #[test]
    fn cheapest_filters_capacity_and_direction() {
        let mut hop = Hop::new(NodeId::from("a"), NodeId::from("b"));
        let mut small = Channel::new(ChannelId::from("1x1x1"), Sats::from_sat(50));
        small.enable(
            Direction::Alph,
            ChannelDirection::new(Sats::ZERO, Decimal::ZERO, Sats::ZERO, Decimal::ZERO, 483),
        );
        let mut reverse_only = Channel::new(ChannelId::from("2x2x2"), Sats::from_sat(10_000));
        reverse_only.enable(
            Direction::NonAlph,
            ChannelDirection::new(Sats::ZERO, Decimal::ZERO, Sats::ZERO, Decimal::ZERO, 483),
        );
        hop.push_channel(small);
        hop.push_channel(reverse_only);

        assert!(hop.cheapest(Sats::from_sat(100), Direction::Alph).is_none());
        assert!(hop.cheapest(Sats::from_sat(100), Direction::NonAlph).is_some());
        assert!(hop.cheapest(Sats::from_sat(40), Direction::Alph).is_some());
    }

    #[test]
    fn capacity_must_cover_the_fee_inclusive_amount() {
        let mut hop = Hop::new(NodeId::from("a"), NodeId::from("b"));
        // Capacity 105 covers the 100 sat body but not body plus the
        // 10 sat success fee this channel would charge.
        let mut tight = Channel::new(ChannelId::from("1x1x1"), Sats::from_sat(105));
        tight.enable(
            Direction::Alph,
            ChannelDirection::new(Sats::from_sat(10), Decimal::ZERO, Sats::ZERO, Decimal::ZERO, 483),
        );
        hop.push_channel(tight);
        assert!(hop.cheapest(Sats::from_sat(100), Direction::Alph).is_none());

        // A roomier parallel channel with the same fee qualifies.
        let mut roomy = Channel::new(ChannelId::from("2x2x2"), Sats::from_sat(110));
        roomy.enable(
            Direction::Alph,
            ChannelDirection::new(Sats::from_sat(10), Decimal::ZERO, Sats::ZERO, Decimal::ZERO, 483),
        );
        hop.push_channel(roomy);
        let choice = hop
            .cheapest(Sats::from_sat(100), Direction::Alph)
            .expect("test: fee-inclusive amount fits");
        assert_eq!(choice.cid, ChannelId::from("2x2x2"));
        assert_eq!(choice.amount, Sats::from_sat(110));
    }
}
