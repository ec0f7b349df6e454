// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet") - Type Definitions

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Unique node identifier in the channel graph.
///
/// Identifiers impose a total order; forwarding direction between two
/// endpoints is derived from that order (see [`Direction`]).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self { NodeId(s) }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self { NodeId(s.to_string()) }
}

// ---------------------------------------------------------------------------
// ChannelId
// ---------------------------------------------------------------------------

/// Short channel identifier, e.g. `565544x1711x1`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self { ChannelId(s) }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self { ChannelId(s.to_string()) }
}

// ---------------------------------------------------------------------------
// Sats
// ---------------------------------------------------------------------------

/// Satoshi denomination backed by `rust_decimal::Decimal`.
///
/// Amounts and fees share one exact representation so that the revenue
/// ledger sums to zero without float drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sats(pub Decimal);

impl Sats {
    /// Zero value
    pub const ZERO: Sats = Sats(Decimal::ZERO);

    /// Create from a `Decimal` value
    pub fn from_decimal(d: Decimal) -> Self {
        Self(d)
    }

    /// Create from a whole satoshi count
    pub fn from_sat(n: u64) -> Self {
        Self(Decimal::from(n))
    }

    /// Whether the value is exactly zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Sats {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Sats {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Sats {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Sats {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Sats {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl fmt::Display for Sats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}sat", self.0)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Forwarding direction across a channel, derived from endpoint order.
///
/// `Alph` forwards from the lesser node identifier to the greater one,
/// `NonAlph` the reverse. A channel carries at most one directional state
/// per tag; an absent state means the direction is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Alph,
    NonAlph,
}

impl Direction {
    /// Direction of a forward from `from` to `to`.
    pub fn of(from: &NodeId, to: &NodeId) -> Direction {
        if from < to {
            Direction::Alph
        } else {
            Direction::NonAlph
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Alph => Direction::NonAlph,
            Direction::NonAlph => Direction::Alph,
        }
    }

    /// Slot index into a channel's directional-state pair.
    pub(crate) fn index(&self) -> usize {
        match self {
            Direction::Alph => 0,
            Direction::NonAlph => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Forwarding failures
// ---------------------------------------------------------------------------

/// Failure kinds at the forwarding level.
///
/// All of these are recovered locally by the engine: `NoRoute` ends event
/// processing, `BalanceFailure` triggers per-route retries, `SlotsJammed`
/// replaces the route (honest) or marks the hop jammed (jamming).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForwardFailure {
    #[error("no route from {sender} to {receiver}")]
    NoRoute { sender: NodeId, receiver: NodeId },

    #[error("no capable channel at hop {at_hop} ({from} -> {to})")]
    NoCapableChannel { at_hop: usize, from: NodeId, to: NodeId },

    #[error("all slots jammed at hop {at_hop}")]
    SlotsJammed { at_hop: usize },

    #[error("balance failure at hop {at_hop}")]
    BalanceFailure { at_hop: usize },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
