//! Core graph data structures.
//!
//! Generalizes the bootstrap repo's fixed-2-port `Component` (exactly one
//! inlet, one outlet) to units with a variable number of named ports — a
//! flash drum has `vapor`/`liquid` outlets, a two-side heat exchanger has
//! `hot_in`/`cold_in` inlets and `hot_out`/`cold_out` outlets, a mixer has
//! `in-1`/`in-2`/... inlets.

use tf_core::{CompId, NodeId, PortId};

/// Direction/kind of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Inlet port (upstream connection).
    Inlet,
    /// Outlet port (downstream connection).
    Outlet,
}

/// A node in the flowsheet graph: one stream segment.
///
/// Nodes are minimal: they hold no thermodynamic data themselves — the
/// solver keeps a separate `stream_id -> StreamState` map keyed by the
/// node's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
}

/// A port connects a component to a node under a logical name
/// (`"in"`, `"vapor"`, `"hot_out"`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub id: PortId,
    pub comp: CompId,
    pub node: NodeId,
    pub kind: PortKind,
    pub name: String,
}

/// A component represents a unit operation instance in the graph.
///
/// Unlike the bootstrap repo's two-port devices, a component here owns a
/// variable number of named ports, split between inlets and outlets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: CompId,
    pub name: String,
    /// Unit-op type tag (e.g. "FlashDrum"), used to look up default port
    /// orderings when a payload omits handles.
    pub kind: String,
    pub ports: Vec<PortId>,
}

impl Component {
    /// Ports of the given kind, in insertion order.
    pub fn ports_of<'a>(&'a self, graph: &'a Graph, kind: PortKind) -> impl Iterator<Item = &'a Port> + 'a {
        self.ports
            .iter()
            .filter_map(move |id| graph.port(*id))
            .filter(move |p| p.kind == kind)
    }

    /// Find a port on this component by its logical name.
    pub fn port_named<'a>(&self, graph: &'a Graph, name: &str) -> Option<&'a Port> {
        self.ports
            .iter()
            .filter_map(|id| graph.port(*id))
            .find(|p| p.name == name)
    }
}

/// The graph: a validated, immutable collection of nodes, components, and ports.
///
/// The graph stores:
/// - All nodes, components, and ports in vectors (indexed by their IDs).
/// - Compact adjacency: for each node, which ports are incident.
///
/// This structure is optimized for parallel iteration and solver indexing.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) components: Vec<Component>,
    pub(crate) ports: Vec<Port>,

    /// Offsets for node->port adjacency: node i's ports are in node_ports[node_port_offsets[i]..node_port_offsets[i+1]].
    pub(crate) node_port_offsets: Vec<usize>,

    /// Flat list of port IDs incident to nodes (sorted by node ID then port ID for determinism).
    pub(crate) node_ports: Vec<PortId>,
}

impl Graph {
    /// Return all nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return all components.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Return all ports.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Get a node by ID (returns None if ID out of bounds).
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index() as usize)
    }

    /// Get a component by ID (returns None if ID out of bounds).
    pub fn component(&self, id: CompId) -> Option<&Component> {
        self.components.get(id.index() as usize)
    }

    /// Find a component by its string name (units are usually addressed by
    /// payload id rather than `CompId`).
    pub fn component_named(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Get a port by ID (returns None if ID out of bounds).
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.index() as usize)
    }

    /// Iterate over all port IDs incident to a given node.
    pub fn node_ports(&self, node_id: NodeId) -> &[PortId] {
        let idx = node_id.index() as usize;
        if idx >= self.nodes.len() {
            return &[];
        }
        let start = self.node_port_offsets[idx];
        let end = self.node_port_offsets[idx + 1];
        &self.node_ports[start..end]
    }

    /// The node attached to a component's named port, if the port exists.
    pub fn comp_port_node(&self, comp_id: CompId, port_name: &str) -> Option<NodeId> {
        let comp = self.component(comp_id)?;
        Some(comp.port_named(self, port_name)?.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_kind_equality() {
        assert_eq!(PortKind::Inlet, PortKind::Inlet);
        assert_ne!(PortKind::Inlet, PortKind::Outlet);
    }

    #[test]
    fn component_port_lookup_by_name() {
        use tf_core::Id;
        let ports = vec![
            Port { id: Id::from_index(0), comp: Id::from_index(0), node: Id::from_index(10), kind: PortKind::Inlet, name: "in".into() },
            Port { id: Id::from_index(1), comp: Id::from_index(0), node: Id::from_index(11), kind: PortKind::Outlet, name: "vapor".into() },
            Port { id: Id::from_index(2), comp: Id::from_index(0), node: Id::from_index(12), kind: PortKind::Outlet, name: "liquid".into() },
        ];
        let comp = Component {
            id: Id::from_index(0),
            name: "flash-1".into(),
            kind: "FlashDrum".into(),
            ports: vec![Id::from_index(0), Id::from_index(1), Id::from_index(2)],
        };
        let graph = Graph {
            nodes: vec![],
            components: vec![comp.clone()],
            ports,
            node_port_offsets: vec![0],
            node_ports: vec![],
        };
        assert_eq!(comp.port_named(&graph, "liquid").unwrap().node.index(), 12);
        assert!(comp.port_named(&graph, "missing").is_none());
        assert_eq!(comp.ports_of(&graph, PortKind::Outlet).count(), 2);
    }
}
