// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Channel Jamming Simulation Suite ("The Gauntlet") - Route Generation

//! Route generation for both workloads.
//!
//! Honest flows draw simple shortest paths (by hop count, non-decreasing
//! length) from a lazy Yen enumeration over the capacity-filtered routing
//! graph. Jamming flows enumerate subsets and permutations of the
//! yet-unjammed target pairs, largest subsets first, and concatenate
//! shortest sub-paths between consecutive anchors; the concatenation may
//! revisit nodes and edges, and every traversal occupies its own slot.
//!
//! Enumerators own their cursor state and take the network model per pull,
//! so the engine can mutate channel state between pulls.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::network::NetworkModel;
use crate::types::{NodeId, Sats};

/// A directed node pair the attacker wants rendered unusable.
pub type TargetPair = (NodeId, NodeId);

// ---------------------------------------------------------------------------
// BFS shortest path
// ---------------------------------------------------------------------------

/// Unweighted shortest path over edges with capacity for `amount`,
/// avoiding `banned_nodes` entirely and the directed `banned_edges`.
///
/// Adjacency lists are pre-sorted, so the first-visit predecessor (and
/// hence the returned path) is deterministic.
fn bfs_shortest(
    net: &NetworkModel,
    from: &NodeId,
    to: &NodeId,
    amount: Sats,
    banned_nodes: &HashSet<NodeId>,
    banned_edges: &HashSet<(NodeId, NodeId)>,
) -> Option<Vec<NodeId>> {
    if from == to {
        return Some(vec![from.clone()]);
    }
    if banned_nodes.contains(from) {
        return None;
    }

    let mut predecessor: HashMap<NodeId, NodeId> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(from.clone());

    while let Some(node) = queue.pop_front() {
        let mut last_neighbor: Option<&NodeId> = None;
        for edge in net.edges_from(&node) {
            if edge.capacity < amount {
                continue;
            }
            // Parallel channels reach the same neighbor; visit it once.
            if last_neighbor == Some(&edge.to) {
                continue;
            }
            last_neighbor = Some(&edge.to);

            if banned_nodes.contains(&edge.to)
                || banned_edges.contains(&(node.clone(), edge.to.clone()))
                || predecessor.contains_key(&edge.to)
                || edge.to == *from
            {
                continue;
            }
            predecessor.insert(edge.to.clone(), node.clone());
            if edge.to == *to {
                let mut path = vec![to.clone()];
                let mut cursor = to;
                while let Some(prev) = predecessor.get(cursor) {
                    path.push(prev.clone());
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(edge.to.clone());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Simple shortest paths, non-decreasing length (lazy Yen enumeration)
// ---------------------------------------------------------------------------

/// Enumerator of simple paths from `from` to `to` in non-decreasing hop
/// count. Candidates are ordered by `(length, path)`, so enumeration is
/// deterministic.
pub struct ShortestPaths {
    from: NodeId,
    to: NodeId,
    amount: Sats,
    accepted: Vec<Vec<NodeId>>,
    candidates: BTreeSet<(usize, Vec<NodeId>)>,
    exhausted: bool,
}

impl ShortestPaths {
    pub fn new(from: NodeId, to: NodeId, amount: Sats) -> Self {
        Self {
            from,
            to,
            amount,
            accepted: Vec::new(),
            candidates: BTreeSet::new(),
            exhausted: false,
        }
    }

    pub fn next_path(&mut self, net: &NetworkModel) -> Option<Vec<NodeId>> {
        if self.exhausted {
            return None;
        }
        let next = if self.accepted.is_empty() {
            bfs_shortest(
                net,
                &self.from,
                &self.to,
                self.amount,
                &HashSet::new(),
                &HashSet::new(),
            )
        } else {
            self.push_spurs(net);
            self.candidates.pop_first().map(|(_, path)| path)
        };
        match next {
            Some(path) => {
                self.accepted.push(path.clone());
                Some(path)
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    /// Generate spur candidates branching off the most recent path.
    fn push_spurs(&mut self, net: &NetworkModel) {
        let last = self.accepted.last().cloned().expect("spurs need a prior path");
        for i in 0..last.len() - 1 {
            let spur_node = &last[i];
            let root = &last[..=i];

            let mut banned_edges: HashSet<(NodeId, NodeId)> = HashSet::new();
            for path in &self.accepted {
                if path.len() > i + 1 && path[..=i] == *root {
                    banned_edges.insert((path[i].clone(), path[i + 1].clone()));
                }
            }
            let banned_nodes: HashSet<NodeId> = root[..i].iter().cloned().collect();

            if let Some(spur) = bfs_shortest(
                net,
                spur_node,
                &self.to,
                self.amount,
                &banned_nodes,
                &banned_edges,
            ) {
                let mut candidate = root[..i].to_vec();
                candidate.extend(spur);
                if !self.accepted.contains(&candidate) {
                    self.candidates.insert((candidate.len(), candidate));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Anchor concatenation
// ---------------------------------------------------------------------------

/// Concatenate shortest sub-paths through `anchors` in order. Consecutive
/// equal anchors collapse; repetitions beyond what the sub-paths produce
/// are neither forced nor forbidden. `None` when any leg has no path.
pub fn route_via(net: &NetworkModel, anchors: &[NodeId], amount: Sats) -> Option<Vec<NodeId>> {
    debug_assert!(!anchors.is_empty());
    let mut route: Vec<NodeId> = vec![anchors[0].clone()];
    for window in anchors.windows(2) {
        let (leg_from, leg_to) = (&window[0], &window[1]);
        if leg_from == leg_to {
            continue;
        }
        let leg = bfs_shortest(net, leg_from, leg_to, amount, &HashSet::new(), &HashSet::new())?;
        route.extend(leg.into_iter().skip(1));
    }
    if route.len() < 2 {
        return None;
    }
    Some(route)
}

// ---------------------------------------------------------------------------
// Honest route enumerator
// ---------------------------------------------------------------------------

/// Routes for one honest event: either the lazy shortest-path stream, or
/// the single concatenation through `must_route_via` anchors.
pub enum HonestRoutes {
    Shortest(ShortestPaths),
    Via { anchors: Vec<NodeId>, amount: Sats, yielded: bool },
}

impl HonestRoutes {
    pub fn new(
        sender: &NodeId,
        receiver: &NodeId,
        amount: Sats,
        must_route_via: &[NodeId],
    ) -> Self {
        if must_route_via.is_empty() {
            HonestRoutes::Shortest(ShortestPaths::new(sender.clone(), receiver.clone(), amount))
        } else {
            let mut anchors = Vec::with_capacity(must_route_via.len() + 2);
            anchors.push(sender.clone());
            anchors.extend(must_route_via.iter().cloned());
            anchors.push(receiver.clone());
            HonestRoutes::Via { anchors, amount, yielded: false }
        }
    }

    pub fn next_route(&mut self, net: &NetworkModel) -> Option<Vec<NodeId>> {
        match self {
            HonestRoutes::Shortest(paths) => paths.next_path(net),
            HonestRoutes::Via { anchors, amount, yielded } => {
                if *yielded {
                    return None;
                }
                *yielded = true;
                route_via(net, anchors, *amount)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Jamming route generator
// ---------------------------------------------------------------------------

/// Subset/permutation enumerator over target pairs.
///
/// Yields routes threading `n = max_pairs .. 1` targets: for each `n`,
/// every `n`-sized subset in lexicographic index order, and for each
/// subset every permutation in lexicographic order. The live unjammed set
/// is re-checked on every pull, so targets jammed mid-batch prune whole
/// subsets without being enumerated.
pub struct JammingRoutes {
    targets: Vec<TargetPair>,
    sender: NodeId,
    receiver: NodeId,
    amount: Sats,
    n: usize,
    combo: Vec<usize>,
    perm: Vec<usize>,
    exhausted: bool,
}

impl JammingRoutes {
    pub fn new(
        targets: Vec<TargetPair>,
        sender: NodeId,
        receiver: NodeId,
        amount: Sats,
        max_pairs: usize,
    ) -> Self {
        let n = max_pairs.min(targets.len());
        let combo: Vec<usize> = (0..n).collect();
        let perm = combo.clone();
        Self { exhausted: n == 0, targets, sender, receiver, amount, n, combo, perm }
    }

    /// The next buildable route whose targets are all still unjammed.
    pub fn next_route(
        &mut self,
        net: &NetworkModel,
        unjammed: &HashSet<TargetPair>,
    ) -> Option<Vec<NodeId>> {
        while !self.exhausted {
            if self
                .combo
                .iter()
                .any(|&i| !unjammed.contains(&self.targets[i]))
            {
                self.advance_combo();
                continue;
            }

            let mut anchors = Vec::with_capacity(2 * self.n + 2);
            anchors.push(self.sender.clone());
            for &i in &self.perm {
                anchors.push(self.targets[i].0.clone());
                anchors.push(self.targets[i].1.clone());
            }
            anchors.push(self.receiver.clone());

            let route = route_via(net, &anchors, self.amount);
            self.advance_perm();
            if route.is_some() {
                return route;
            }
        }
        None
    }

    fn advance_perm(&mut self) {
        if !next_permutation(&mut self.perm) {
            self.advance_combo();
        }
    }

    fn advance_combo(&mut self) {
        if next_combination(&mut self.combo, self.targets.len()) {
            self.perm = self.combo.clone();
            return;
        }
        if self.n > 1 {
            self.n -= 1;
            self.combo = (0..self.n).collect();
            self.perm = self.combo.clone();
            return;
        }
        self.exhausted = true;
    }
}

/// Lexicographic next permutation in place; false when already the last.
fn next_permutation(values: &mut [usize]) -> bool {
    if values.len() < 2 {
        return false;
    }
    let mut i = values.len() - 1;
    while i > 0 && values[i - 1] >= values[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = values.len() - 1;
    while values[j] <= values[i - 1] {
        j -= 1;
    }
    values.swap(i - 1, j);
    values[i..].reverse();
    true
}

/// Lexicographic next k-combination of `0..pool`; false when exhausted.
fn next_combination(combo: &mut [usize], pool: usize) -> bool {
    let k = combo.len();
    if k == 0 {
        return false;
    }
    let mut i = k;
    while i > 0 {
        i -= 1;
        if combo[i] < pool - (k - i) {
            combo[i] += 1;
            for j in i + 1..k {
                combo[j] = combo[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
