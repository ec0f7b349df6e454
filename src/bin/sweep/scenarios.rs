// Scenario Definitions — the built-in wheel topology plus snapshot loading
// A scenario bundles the topology with its honest candidate sets and the
// attack description the jamming workload runs against it.

use gauntlet_engine::{ChannelId, ChannelSpec, JammingAttack, NodeId, Sats, Workload};
use rust_decimal::Decimal;

pub struct Scenario {
    pub name: String,
    pub specs: Vec<ChannelSpec>,
    pub honest: Workload,
    pub attack: Option<JammingAttack>,
}

fn spec(source: &str, destination: &str, cid: &str, capacity: u64) -> ChannelSpec {
    ChannelSpec {
        source: NodeId::from(source),
        destination: NodeId::from(destination),
        cid: ChannelId::from(cid),
        capacity: Sats::from_sat(capacity),
        // 1 sat base, 100 ppm: typical defaults in public snapshots.
        base_success: Sats::from_sat(1),
        rate_success: Decimal::new(100, 6),
    }
}

fn both_ways(a: &str, b: &str, cid: &str, capacity: u64) -> [ChannelSpec; 2] {
    [spec(a, b, cid, capacity), spec(b, a, cid, capacity)]
}

/// The wheel: a central hub with rim nodes, the attacker entering through
/// alice and collecting at a node of its own behind bob.
pub fn wheel() -> Scenario {
    let mut specs = Vec::new();
    specs.extend(both_ways("a-sender", "alice", "900x1x0", 10_000_000));
    specs.extend(both_ways("alice", "hub", "100x1x0", 1_000_000));
    specs.extend(both_ways("hub", "bob", "100x2x0", 1_000_000));
    specs.extend(both_ways("hub", "carol", "100x3x0", 1_000_000));
    specs.extend(both_ways("bob", "z-receiver", "900x2x0", 10_000_000));

    let rim = vec![NodeId::from("alice"), NodeId::from("bob"), NodeId::from("carol")];
    Scenario {
        name: "wheel".to_string(),
        specs,
        honest: Workload::Honest { senders: rim.clone(), receivers: rim },
        attack: Some(JammingAttack {
            sender: NodeId::from("a-sender"),
            receiver: NodeId::from("z-receiver"),
            target_pairs: vec![
                (NodeId::from("alice"), NodeId::from("hub")),
                (NodeId::from("hub"), NodeId::from("alice")),
                (NodeId::from("bob"), NodeId::from("hub")),
                (NodeId::from("hub"), NodeId::from("bob")),
            ],
        }),
    }
}

/// A scenario over an external snapshot: every node is an honest sender
/// and receiver candidate; no attack is defined for unknown topologies.
pub fn from_snapshot(name: String, specs: Vec<ChannelSpec>) -> Scenario {
    let mut nodes: Vec<NodeId> = specs
        .iter()
        .flat_map(|s| [s.source.clone(), s.destination.clone()])
        .collect();
    nodes.sort();
    nodes.dedup();
    Scenario {
        name,
        specs,
        honest: Workload::Honest { senders: nodes.clone(), receivers: nodes },
        attack: None,
    }
}
