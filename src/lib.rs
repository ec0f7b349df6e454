// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet")

//! Discrete-event simulator for payment-channel jamming and
//! unconditional-fee countermeasures.
//!
//! The engine replays an honest workload of random payments and a jamming
//! workload that deliberately occupies per-channel HTLC slots against the
//! same topology, and reports per-node revenue plus aggregate counters.

pub mod channel;
pub mod ledger;
pub mod network;
pub mod params;
pub mod payment;
pub mod router;
pub mod schedule;
pub mod simulation;
pub mod snapshot;
pub mod types;

pub use network::NetworkModel;
pub use params::SimulationParams;
pub use simulation::{
    GauntletSimulation, JammingAttack, RunResult, RunStats, SimulationError, Workload,
};
pub use snapshot::{parse_snapshot, ChannelSpec, SnapshotError};
pub use types::{ChannelId, Direction, ForwardFailure, NodeId, Sats};
