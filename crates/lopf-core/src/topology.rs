//! Sub-network detection.
//!
//! A sub-network is a maximal set of buses connected through AC lines.
//! Transport links are controllable transfers between sub-networks and are
//! ignored when labelling components.

use crate::{BusId, Edge, LineId, Network, SubNetworkId};
use petgraph::visit::EdgeRef;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

/// Electrically connected subset of the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubNetwork {
    pub id: SubNetworkId,
    /// Member buses in insertion order
    pub buses: Vec<BusId>,
    /// AC lines with both ends inside this sub-network
    pub lines: Vec<LineId>,
    /// Angle reference bus (first member)
    pub slack_bus: BusId,
}

impl SubNetwork {
    pub fn contains(&self, bus: BusId) -> bool {
        self.buses.contains(&bus)
    }
}

impl std::fmt::Display for SubNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SubNetwork {} ({} buses, {} lines)",
            self.id.value(),
            self.buses.len(),
            self.lines.len()
        )
    }
}

impl Network {
    /// Partition buses into AC-connected sub-networks (breadth-first search
    /// over line edges) and store the result on the network.
    pub fn determine_network_topology(&mut self) -> &[SubNetwork] {
        let mut visited = HashSet::new();
        let mut sub_networks = Vec::new();

        for start in self.graph.node_indices() {
            if visited.contains(&start) {
                continue;
            }
            let mut queue = VecDeque::new();
            queue.push_back(start);
            let mut members = Vec::new();
            let mut lines = HashSet::new();
            while let Some(node) = queue.pop_front() {
                if !visited.insert(node) {
                    continue;
                }
                members.push(node);
                for edge in self.graph.edges(node) {
                    if let Edge::Line(line) = edge.weight() {
                        lines.insert(line.id);
                        let neighbor = if edge.source() == node {
                            edge.target()
                        } else {
                            edge.source()
                        };
                        if !visited.contains(&neighbor) {
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
            members.sort();
            let buses: Vec<BusId> = members.iter().map(|n| BusId::new(n.index())).collect();
            let mut lines: Vec<LineId> = lines.into_iter().collect();
            lines.sort();
            let id = SubNetworkId::new(sub_networks.len());
            debug!(
                sub_network = id.value(),
                buses = buses.len(),
                lines = lines.len(),
                "labelled sub-network"
            );
            sub_networks.push(SubNetwork {
                id,
                slack_bus: buses[0],
                buses,
                lines,
            });
        }

        info!(count = sub_networks.len(), "determined network topology");
        self.sub_networks = sub_networks;
        &self.sub_networks
    }

    /// Whether topology has been determined for the current buses and lines.
    ///
    /// Adding a bus or a line discards the stored sub-networks.
    pub fn has_topology(&self) -> bool {
        let covered: usize = self.sub_networks.iter().map(|s| s.buses.len()).sum();
        !self.sub_networks.is_empty() && covered == self.graph.node_count()
    }

    pub fn sub_network_of(&self, bus: BusId) -> Option<&SubNetwork> {
        self.sub_networks.iter().find(|s| s.contains(bus))
    }
}
