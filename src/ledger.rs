// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet") - Revenue Ledger

//! Per-node revenue accounting.
//!
//! The ledger is mutated in exactly two places: the unconditional-fee
//! debit when a payment enters a hop, and the success-fee transfer when an
//! HTLC resolves. Both are symmetric transfers between neighbors, so the
//! ledger sums to zero at every reachable state.

use std::collections::BTreeMap;

use crate::types::{NodeId, Sats};

/// Signed running balance per node.
#[derive(Debug, Clone, Default)]
pub struct RevenueLedger {
    balances: BTreeMap<NodeId, Sats>,
}

impl RevenueLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `amount` from `from` to `to`. Zero transfers are dropped so
    /// untouched nodes never appear in the output map.
    pub fn transfer(&mut self, from: &NodeId, to: &NodeId, amount: Sats) {
        if amount.is_zero() {
            return;
        }
        *self.balances.entry(from.clone()).or_insert(Sats::ZERO) -= amount;
        *self.balances.entry(to.clone()).or_insert(Sats::ZERO) += amount;
    }

    pub fn balance(&self, node: &NodeId) -> Sats {
        self.balances.get(node).copied().unwrap_or(Sats::ZERO)
    }

    /// Sum over all balances. Zero by construction; exposed for audits.
    pub fn total(&self) -> Sats {
        self.balances
            .values()
            .fold(Sats::ZERO, |acc, &v| acc + v)
    }

    /// Whether every balance is exactly zero.
    pub fn is_all_zero(&self) -> bool {
        self.balances.values().all(|v| v.is_zero())
    }

    pub fn reset(&mut self) {
        self.balances.clear();
    }

    /// Snapshot for result emission, in node-id order.
    pub fn snapshot(&self) -> BTreeMap<NodeId, Sats> {
        self.balances.clone()
    }
}
