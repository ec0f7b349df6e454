// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet") - Payment Construction

//! Wrapped payments.
//!
//! A payment is built once per route attempt by walking the route
//! backwards from the receiver: each hop picks its cheapest qualifying
//! channel, charges its success fee on what it forwards downstream, and
//! levies its unconditional fee on the amount it is asked to carry. The
//! nesting described by the protocol is flattened into a per-hop vector
//! consumed left-to-right by the forwarding engine.

use crate::network::NetworkModel;
use crate::schedule::Event;
use crate::types::{ChannelId, Direction, ForwardFailure, NodeId, Sats};

// ---------------------------------------------------------------------------
// HopPayment / Payment
// ---------------------------------------------------------------------------

/// One hop of a wrapped payment.
#[derive(Debug, Clone, PartialEq)]
pub struct HopPayment {
    pub upstream: NodeId,
    pub downstream: NodeId,
    pub cid: ChannelId,
    /// What the downstream node receives and forwards onward.
    pub body: Sats,
    /// What this hop is asked to carry: body plus this hop's success fee.
    pub amount: Sats,
    pub success_fee: Sats,
    pub upfront_fee: Sats,
}

/// A fully-priced payment for one route attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    /// Hops in forwarding order, sender first.
    pub hops: Vec<HopPayment>,
    pub desired_result: bool,
    pub processing_delay: f64,
}

impl Payment {
    /// The amount the sender pays on entry into the first hop.
    pub fn total_amount(&self) -> Sats {
        self.hops.first().map(|h| h.amount).unwrap_or(Sats::ZERO)
    }

    pub fn receiver(&self) -> Option<&NodeId> {
        self.hops.last().map(|h| &h.downstream)
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Price a route for `event`, choosing the cheapest qualifying channel at
/// every hop. Fails with `NoCapableChannel` when some hop has no enabled
/// channel with capacity for the amount it would carry.
pub fn build_payment(
    net: &NetworkModel,
    route: &[NodeId],
    event: &Event,
) -> Result<Payment, ForwardFailure> {
    debug_assert!(route.len() >= 2, "a route has at least sender and receiver");

    let mut hops: Vec<HopPayment> = Vec::with_capacity(route.len() - 1);
    let mut downstream_amount = event.amount;

    for i in (0..route.len() - 1).rev() {
        let upstream = &route[i];
        let downstream = &route[i + 1];
        let direction = Direction::of(upstream, downstream);
        let choice = net
            .hop(upstream, downstream)
            .and_then(|hop| hop.cheapest(downstream_amount, direction))
            .ok_or_else(|| ForwardFailure::NoCapableChannel {
                at_hop: i,
                from: upstream.clone(),
                to: downstream.clone(),
            })?;

        hops.push(HopPayment {
            upstream: upstream.clone(),
            downstream: downstream.clone(),
            cid: choice.cid,
            body: downstream_amount,
            amount: choice.amount,
            success_fee: choice.success_fee,
            upfront_fee: choice.upfront_fee,
        });
        downstream_amount = choice.amount;
    }

    hops.reverse();
    Ok(Payment {
        hops,
        desired_result: event.desired_result,
        processing_delay: event.processing_delay,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SimulationParams;
    use crate::snapshot::ChannelSpec;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn spec(
        source: &str,
        destination: &str,
        cid: &str,
        base_msat: u64,
        rate_ppm: u64,
    ) -> ChannelSpec {
        ChannelSpec {
            source: NodeId::from(source),
            destination: NodeId::from(destination),
            cid: ChannelId::from(cid),
            capacity: Sats::from_sat(1_000_000),
            base_success: Sats(Decimal::from(base_msat) / Decimal::from(1000)),
            rate_success: Decimal::from(rate_ppm) / Decimal::from(1_000_000),
        }
    }

    fn event(sender: &str, receiver: &str, amount: u64) -> Event {
        Event {
            time: 0.0,
            sender: NodeId::from(sender),
            receiver: NodeId::from(receiver),
            amount: Sats::from_sat(amount),
            desired_result: true,
            processing_delay: 2.0,
            must_route_via: Vec::new(),
        }
    }

    #[test]
    fn fees_accumulate_backwards() {
        // alice -> bob -> carol; both hops charge base 1 sat + 1000 ppm.
        let mut params = SimulationParams::default();
        params.upfront_base_coeff = dec!(2);
        let specs = vec![
            spec("alice", "bob", "1x1x1", 1000, 1000),
            spec("bob", "carol", "2x2x2", 1000, 1000),
        ];
        let net = NetworkModel::from_specs(&specs, &params).unwrap();

        let route = [NodeId::from("alice"), NodeId::from("bob"), NodeId::from("carol")];
        let payment =
            build_payment(&net, &route, &event("alice", "carol", 10_000)).expect("test: priced");

        assert_eq!(payment.hops.len(), 2);
        // Last hop: body 10000, fee 1 + 0.001 * 10000 = 11.
        let last = &payment.hops[1];
        assert_eq!(last.body, Sats::from_sat(10_000));
        assert_eq!(last.success_fee, Sats::from_decimal(dec!(11)));
        assert_eq!(last.amount, Sats::from_decimal(dec!(10011)));
        // First hop carries the last hop's amount as body.
        let first = &payment.hops[0];
        assert_eq!(first.body, Sats::from_decimal(dec!(10011)));
        assert_eq!(first.success_fee, Sats::from_decimal(dec!(11.011)));
        assert_eq!(first.amount, Sats::from_decimal(dec!(10022.011)));
        // Upfront fee is levied on the carried amount: 2 * base = 2 sats flat.
        assert_eq!(first.upfront_fee, Sats::from_decimal(dec!(2)));
        assert_eq!(payment.total_amount(), Sats::from_decimal(dec!(10022.011)));
        assert_eq!(payment.receiver(), Some(&NodeId::from("carol")));
    }

    #[test]
    fn missing_capacity_fails_with_hop_index() {
        let mut small = spec("alice", "bob", "1x1x1", 0, 0);
        small.capacity = Sats::from_sat(100);
        let specs = vec![small, spec("bob", "carol", "2x2x2", 0, 0)];
        let net = NetworkModel::from_specs(&specs, &SimulationParams::default()).unwrap();

        let route = [NodeId::from("alice"), NodeId::from("bob"), NodeId::from("carol")];
        let err = build_payment(&net, &route, &event("alice", "carol", 10_000))
            .expect_err("test: alice->bob lacks capacity");
        assert_eq!(
            err,
            ForwardFailure::NoCapableChannel {
                at_hop: 0,
                from: NodeId::from("alice"),
                to: NodeId::from("bob"),
            }
        );
    }

    #[test]
    fn disabled_direction_fails() {
        // Only alice -> bob declared; the reverse is disabled.
        let specs = vec![spec("alice", "bob", "1x1x1", 0, 0)];
        let net = NetworkModel::from_specs(&specs, &SimulationParams::default()).unwrap();
        let route = [NodeId::from("bob"), NodeId::from("alice")];
        let err = build_payment(&net, &route, &event("bob", "alice", 100))
            .expect_err("test: reverse direction disabled");
        assert!(matches!(err, ForwardFailure::NoCapableChannel { at_hop: 0, .. }));
    }
}
