//! Direct call graph over a registry, using petgraph::StableDiGraph

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::model::{Edge, EdgeKind, UnitId};
use crate::registry::Registry;

/// Direct caller/callee sets of one unit, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectRelations {
    pub callers: Vec<UnitId>,
    pub callees: Vec<UnitId>,
}

impl DirectRelations {
    /// Edges as seen from `target`.
    pub fn edges(&self, target: UnitId) -> Vec<Edge> {
        let callers = self
            .callers
            .iter()
            .map(|&caller| Edge::direct(EdgeKind::DirectCaller, caller, target));
        let callees = self
            .callees
            .iter()
            .map(|&callee| Edge::direct(EdgeKind::DirectCallee, target, callee));
        callers.chain(callees).collect()
    }
}

/// The call graph: one node per unit, one edge per resolved call.
///
/// A unit whose call-set names itself gets a self-loop; no cycle handling
/// is needed since queries only look one hop away.
pub struct CallGraph {
    inner: StableDiGraph<UnitId, ()>,
}

impl std::fmt::Debug for CallGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl CallGraph {
    /// Build the graph by matching every call-set name against the registry.
    pub fn build(registry: &Registry) -> Self {
        let mut inner = StableDiGraph::with_capacity(registry.len(), 0);
        for id in registry.ids() {
            inner.add_node(id);
        }

        for (caller, unit) in registry.iter() {
            for name in &unit.calls {
                for &callee in registry.lookup_all(name) {
                    inner.add_edge(index(caller), index(callee), ());
                }
            }
        }

        tracing::debug!(
            "Call graph built: {} nodes, {} edges",
            inner.node_count(),
            inner.edge_count()
        );

        CallGraph { inner }
    }

    /// Total number of units.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of resolved calls.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Units whose call-set names `target`.
    pub fn callers(&self, target: UnitId) -> Vec<UnitId> {
        self.neighbors(target, Direction::Incoming)
    }

    /// Registered units named in `target`'s call-set.
    pub fn callees(&self, target: UnitId) -> Vec<UnitId> {
        self.neighbors(target, Direction::Outgoing)
    }

    pub fn direct(&self, target: UnitId) -> DirectRelations {
        DirectRelations {
            callers: self.callers(target),
            callees: self.callees(target),
        }
    }

    fn neighbors(&self, unit: UnitId, direction: Direction) -> Vec<UnitId> {
        if !self.inner.contains_node(index(unit)) {
            return Vec::new();
        }
        let mut ids: Vec<UnitId> = self
            .inner
            .neighbors_directed(index(unit), direction)
            .filter_map(|idx| self.inner.node_weight(idx).copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

fn index(id: UnitId) -> NodeIndex {
    NodeIndex::new(id.0)
}
