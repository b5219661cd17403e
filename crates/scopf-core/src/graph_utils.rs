//! Topological helpers: electrical islands of the network, optionally with one
//! branch taken out of service.
//!
//! Islands matter for the DC model because bus angles are only determined up
//! to a constant shift within each connected component, and because power
//! balance has to close separately in every component.

use crate::{BranchId, BusId, Network};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use std::collections::BTreeMap;

/// Island labelling of every bus (standard components approach, BFS from the
/// lowest unvisited bus id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandMap {
    assignments: BTreeMap<BusId, usize>,
    /// Lowest bus id of each island, indexed by island number
    references: Vec<BusId>,
}

impl IslandMap {
    /// Number of islands
    pub fn count(&self) -> usize {
        self.references.len()
    }

    pub fn island_of(&self, bus: BusId) -> Option<usize> {
        self.assignments.get(&bus).copied()
    }

    /// One bus per island: the lowest identifier in that island.
    pub fn references(&self) -> &[BusId] {
        &self.references
    }

    /// Buses of island `island`, in id order.
    pub fn members(&self, island: usize) -> impl Iterator<Item = BusId> + '_ {
        self.assignments
            .iter()
            .filter(move |(_, &i)| i == island)
            .map(|(&bus, _)| bus)
    }
}

/// Label the islands of `network` with `outaged` (if any) removed.
pub fn islands(network: &Network, outaged: Option<BranchId>) -> IslandMap {
    let mut graph: UnGraph<BusId, BranchId> = UnGraph::new_undirected();
    let mut index: BTreeMap<BusId, NodeIndex> = BTreeMap::new();
    for bus in network.buses() {
        index.insert(bus.id, graph.add_node(bus.id));
    }
    for branch in network.branches() {
        if Some(branch.id) == outaged {
            continue;
        }
        if let (Some(&a), Some(&b)) = (index.get(&branch.from_bus()), index.get(&branch.to_bus())) {
            graph.add_edge(a, b, branch.id);
        }
    }

    let mut assignments = BTreeMap::new();
    let mut references = Vec::new();
    for (&bus, &node) in &index {
        if assignments.contains_key(&bus) {
            continue;
        }
        let island_id = references.len();
        references.push(bus);
        let mut bfs = Bfs::new(&graph, node);
        while let Some(visited) = bfs.next(&graph) {
            assignments.insert(graph[visited], island_id);
        }
    }

    IslandMap {
        assignments,
        references,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Branch, NetworkBuilder};

    fn radial() -> Network {
        // 1 - 2 - 3, plus 3 - 4 doubled
        NetworkBuilder::new()
            .bus_count(4)
            .branch(Branch::new(1, 2, 1, 0.1))
            .branch(Branch::new(2, 3, 1, 0.1))
            .branch(Branch::new(3, 4, 1, 0.1))
            .branch(Branch::new(3, 4, 2, 0.1))
            .build()
            .unwrap()
    }

    #[test]
    fn connected_network_is_one_island() {
        let map = islands(&radial(), None);
        assert_eq!(map.count(), 1);
        assert_eq!(map.references(), &[BusId::new(1)]);
    }

    #[test]
    fn radial_outage_splits() {
        let map = islands(&radial(), Some(BranchId::new(2, 3, 1)));
        assert_eq!(map.count(), 2);
        assert_eq!(map.references(), &[BusId::new(1), BusId::new(3)]);
        assert_eq!(map.island_of(BusId::new(4)), Some(1));
        let second: Vec<_> = map.members(1).collect();
        assert_eq!(second, [BusId::new(3), BusId::new(4)]);
    }

    #[test]
    fn parallel_circuit_keeps_connection() {
        let map = islands(&radial(), Some(BranchId::new(3, 4, 1)));
        assert_eq!(map.count(), 1);
    }
}
