// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet") - Network Model

//! The network model and its two graph views.
//!
//! Hops are owned once, in an undirected index keyed by the ordered node
//! pair; path search runs over a separate directed adjacency with one edge
//! per enabled channel direction. Search must see parallel edges and
//! directions as distinct, while forwarding mutates the single underlying
//! directional state.

use std::collections::HashMap;

use crate::channel::{Channel, ChannelDirection, Hop};
use crate::params::SimulationParams;
use crate::snapshot::{ChannelSpec, SnapshotError};
use crate::types::{ChannelId, Direction, NodeId, Sats};

// ---------------------------------------------------------------------------
// NodePair
// ---------------------------------------------------------------------------

/// Unordered node pair, stored in identifier order.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NodePair(pub NodeId, pub NodeId);

impl NodePair {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

// ---------------------------------------------------------------------------
// Routing view
// ---------------------------------------------------------------------------

/// One directed edge of the routing multigraph.
#[derive(Debug, Clone)]
pub struct RoutingEdge {
    pub to: NodeId,
    pub cid: ChannelId,
    pub capacity: Sats,
}

// ---------------------------------------------------------------------------
// NetworkModel
// ---------------------------------------------------------------------------

/// Owns every hop; exposes the hop index for state access and the directed
/// adjacency for path search.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    hops: HashMap<NodePair, Hop>,
    adjacency: HashMap<NodeId, Vec<RoutingEdge>>,
    nodes: Vec<NodeId>,
}

impl NetworkModel {
    /// Build the model from validated per-direction channel records.
    ///
    /// Unconditional-fee coefficients are derived from the success-case
    /// coefficients via the configured multipliers; the slot budget is
    /// uniform across directions.
    pub fn from_specs(
        specs: &[ChannelSpec],
        params: &SimulationParams,
    ) -> Result<Self, SnapshotError> {
        let mut hops: HashMap<NodePair, Hop> = HashMap::new();

        for spec in specs {
            if spec.source == spec.destination {
                return Err(SnapshotError::SelfChannel(spec.cid.clone()));
            }
            let pair = NodePair::new(spec.source.clone(), spec.destination.clone());
            let hop = hops
                .entry(pair)
                .or_insert_with(|| Hop::new(spec.source.clone(), spec.destination.clone()));

            let direction = Direction::of(&spec.source, &spec.destination);
            let state = ChannelDirection::new(
                spec.base_success,
                spec.rate_success,
                Sats(params.upfront_base_coeff * spec.base_success.0),
                params.upfront_rate_coeff * spec.rate_success,
                params.default_num_slots,
            );

            let known = hop.channels().iter().any(|c| c.cid == spec.cid);
            if known {
                let channel = hop.channel_mut(&spec.cid).expect("presence checked above");
                if channel.capacity != spec.capacity {
                    return Err(SnapshotError::InconsistentCapacity(spec.cid.clone()));
                }
                if channel.is_enabled(direction) {
                    return Err(SnapshotError::DuplicateDirection(spec.cid.clone()));
                }
                channel.enable(direction, state);
            } else {
                let mut channel = Channel::new(spec.cid.clone(), spec.capacity);
                channel.enable(direction, state);
                hop.push_channel(channel);
            }
        }

        let mut model = Self { hops, adjacency: HashMap::new(), nodes: Vec::new() };
        model.rebuild_routing_graph();
        Ok(model)
    }

    /// Rebuild the directed adjacency from the owned hops. Edge lists are
    /// kept in `(to, cid)` order so path search is deterministic.
    fn rebuild_routing_graph(&mut self) {
        let mut adjacency: HashMap<NodeId, Vec<RoutingEdge>> = HashMap::new();
        for hop in self.hops.values() {
            let (lesser, greater) = hop.endpoints.clone();
            adjacency.entry(lesser.clone()).or_default();
            adjacency.entry(greater.clone()).or_default();
            for channel in hop.channels() {
                if channel.is_enabled(Direction::Alph) {
                    adjacency.entry(lesser.clone()).or_default().push(RoutingEdge {
                        to: greater.clone(),
                        cid: channel.cid.clone(),
                        capacity: channel.capacity,
                    });
                }
                if channel.is_enabled(Direction::NonAlph) {
                    adjacency.entry(greater.clone()).or_default().push(RoutingEdge {
                        to: lesser.clone(),
                        cid: channel.cid.clone(),
                        capacity: channel.capacity,
                    });
                }
            }
        }
        for edges in adjacency.values_mut() {
            edges.sort_by(|a, b| a.to.cmp(&b.to).then_with(|| a.cid.cmp(&b.cid)));
        }
        let mut nodes: Vec<NodeId> = adjacency.keys().cloned().collect();
        nodes.sort();
        self.adjacency = adjacency;
        self.nodes = nodes;
    }

    pub fn contains_node(&self, node: &NodeId) -> bool {
        self.adjacency.contains_key(node)
    }

    /// All node identifiers, sorted.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Outgoing routing edges of `node`, in `(to, cid)` order.
    pub fn edges_from(&self, node: &NodeId) -> &[RoutingEdge] {
        self.adjacency.get(node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn hop(&self, a: &NodeId, b: &NodeId) -> Option<&Hop> {
        self.hops.get(&NodePair::new(a.clone(), b.clone()))
    }

    pub fn hop_mut(&mut self, a: &NodeId, b: &NodeId) -> Option<&mut Hop> {
        self.hops.get_mut(&NodePair::new(a.clone(), b.clone()))
    }

    /// The directional state used when forwarding `from -> to` over `cid`.
    pub fn direction_mut(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        cid: &ChannelId,
    ) -> Option<&mut ChannelDirection> {
        let direction = Direction::of(from, to);
        self.hop_mut(from, to)?
            .channel_mut(cid)?
            .direction_mut(direction)
    }

    /// Visit every enabled channel direction mutably (drain, audits).
    pub fn for_each_direction_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&NodePair, &ChannelId, Direction, &mut ChannelDirection),
    {
        let mut pairs: Vec<NodePair> = self.hops.keys().cloned().collect();
        pairs.sort();
        for pair in pairs {
            let hop = self.hops.get_mut(&pair).expect("key from own map");
            for channel in hop.channels_mut() {
                let cid = channel.cid.clone();
                for direction in [Direction::Alph, Direction::NonAlph] {
                    if let Some(state) = channel.direction_mut(direction) {
                        f(&pair, &cid, direction, state);
                    }
                }
            }
        }
    }

    /// Clear all in-flight queues. Topology and fees are untouched.
    pub fn reset_runtime_state(&mut self) {
        self.for_each_direction_mut(|_, _, _, state| state.reset());
    }

    /// Total in-flight obligations across every directional queue.
    pub fn total_in_flight(&self) -> usize {
        self.hops
            .values()
            .flat_map(|hop| hop.channels())
            .map(|channel| {
                [Direction::Alph, Direction::NonAlph]
                    .into_iter()
                    .filter_map(|d| channel.direction(d))
                    .map(|state| state.len())
                    .sum::<usize>()
            })
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
