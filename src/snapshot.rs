// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet") - Topology Snapshot

//! Topology snapshot input.
//!
//! The snapshot is a JSON document with a `channels` array in which every
//! undirected channel appears once per enabled direction. A direction
//! absent from the snapshot (or marked inactive) stays disabled. Parsing
//! failures are fatal to the simulation, unlike forwarding failures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, NodeId, Sats};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal input-validation errors.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("malformed snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("channel {0} connects a node to itself")]
    SelfChannel(ChannelId),

    #[error("channel {0} has non-positive capacity")]
    ZeroCapacity(ChannelId),

    #[error("channel {0} declares the same direction twice")]
    DuplicateDirection(ChannelId),

    #[error("channel {0} appears with conflicting capacities")]
    InconsistentCapacity(ChannelId),
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    channels: Vec<SnapshotChannel>,
}

/// One directed channel entry as it appears in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotChannel {
    pub source: String,
    pub destination: String,
    pub short_channel_id: String,
    /// Channel capacity in whole satoshis.
    pub satoshis: u64,
    pub active: bool,
    pub base_fee_millisatoshi: u64,
    pub fee_per_millionth: u64,
}

// ---------------------------------------------------------------------------
// ChannelSpec
// ---------------------------------------------------------------------------

/// A validated per-direction channel record, ready for model construction.
///
/// Success-fee coefficients are already converted to sat units:
/// `base_success = base_fee_millisatoshi / 1000`,
/// `rate_success = fee_per_millionth / 1_000_000`.
#[derive(Debug, Clone)]
pub struct ChannelSpec {
    pub source: NodeId,
    pub destination: NodeId,
    pub cid: ChannelId,
    pub capacity: Sats,
    pub base_success: Sats,
    pub rate_success: Decimal,
}

impl ChannelSpec {
    fn from_snapshot(entry: &SnapshotChannel) -> Result<Self, SnapshotError> {
        let cid = ChannelId::from(entry.short_channel_id.clone());
        if entry.source == entry.destination {
            return Err(SnapshotError::SelfChannel(cid));
        }
        if entry.satoshis == 0 {
            return Err(SnapshotError::ZeroCapacity(cid));
        }
        Ok(Self {
            source: NodeId::from(entry.source.clone()),
            destination: NodeId::from(entry.destination.clone()),
            cid,
            capacity: Sats::from_sat(entry.satoshis),
            base_success: Sats(Decimal::from(entry.base_fee_millisatoshi) / Decimal::from(1000)),
            rate_success: Decimal::from(entry.fee_per_millionth) / Decimal::from(1_000_000),
        })
    }
}

/// Parse a snapshot document into validated per-direction records.
///
/// Inactive entries are dropped here, which is what disables a direction.
pub fn parse_snapshot(json: &str) -> Result<Vec<ChannelSpec>, SnapshotError> {
    let file: SnapshotFile = serde_json::from_str(json)?;
    let specs = file
        .channels
        .iter()
        .filter(|c| c.active)
        .map(ChannelSpec::from_snapshot)
        .collect::<Result<Vec<_>, _>>()?;
    log::info!(
        "snapshot: {} directed entries ({} active)",
        file.channels.len(),
        specs.len()
    );
    Ok(specs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SNAPSHOT: &str = r#"{
        "channels": [
            {
                "source": "alice", "destination": "bob",
                "short_channel_id": "100x1x0", "satoshis": 50000, "active": true,
                "base_fee_millisatoshi": 1000, "fee_per_millionth": 100
            },
            {
                "source": "bob", "destination": "alice",
                "short_channel_id": "100x1x0", "satoshis": 50000, "active": false,
                "base_fee_millisatoshi": 2000, "fee_per_millionth": 200
            }
        ]
    }"#;

    #[test]
    fn parse_converts_fee_units() {
        let specs = parse_snapshot(SNAPSHOT).expect("test: valid snapshot");
        // The inactive reverse direction is dropped.
        assert_eq!(specs.len(), 1);
        let spec = &specs[0];
        assert_eq!(spec.source, NodeId::from("alice"));
        assert_eq!(spec.capacity, Sats::from_sat(50_000));
        assert_eq!(spec.base_success, Sats::from_decimal(dec!(1)));
        assert_eq!(spec.rate_success, dec!(0.0001));
    }

    #[test]
    fn parse_rejects_self_channel() {
        let json = r#"{"channels": [{
            "source": "alice", "destination": "alice",
            "short_channel_id": "1x1x1", "satoshis": 1000, "active": true,
            "base_fee_millisatoshi": 0, "fee_per_millionth": 0
        }]}"#;
        let err = parse_snapshot(json).expect_err("test: self channel is fatal");
        assert!(matches!(err, SnapshotError::SelfChannel(_)), "got {err}");
    }

    #[test]
    fn parse_rejects_zero_capacity() {
        let json = r#"{"channels": [{
            "source": "alice", "destination": "bob",
            "short_channel_id": "1x1x1", "satoshis": 0, "active": true,
            "base_fee_millisatoshi": 0, "fee_per_millionth": 0
        }]}"#;
        let err = parse_snapshot(json).expect_err("test: zero capacity is fatal");
        assert!(matches!(err, SnapshotError::ZeroCapacity(_)), "got {err}");
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = parse_snapshot("{\"channels\": oops").expect_err("test: bad json");
        assert!(matches!(err, SnapshotError::Json(_)));
    }
}
