//! Graph validation logic.

use std::collections::{HashMap, HashSet};
use tf_core::{NodeId, PortId, TfResult};

use crate::error::GraphError;
use crate::graph::{Component, Node, Port, PortKind};

/// Validate the graph structure: all references exist, ports are consistent, etc.
pub(crate) fn validate_structure(
    nodes: &[Node],
    components: &[Component],
    ports: &[Port],
) -> TfResult<()> {
    // Check that port IDs are contiguous and match their indices
    for (i, port) in ports.iter().enumerate() {
        if port.id.index() as usize != i {
            return Err(GraphError::InconsistentAdjacency {
                port: port.id,
                node: port.node,
            }
            .into());
        }
    }

    // Check that each port references a valid node
    for port in ports {
        if port.node.index() as usize >= nodes.len() {
            return Err(GraphError::InvalidNodeRef {
                port: port.id,
                node: port.node,
            }
            .into());
        }
    }

    // Check that each port references a valid component
    for port in ports {
        if port.comp.index() as usize >= components.len() {
            return Err(GraphError::InvalidCompRef {
                port: port.id,
                comp: port.comp,
            }
            .into());
        }
    }

    // Check each component
    for comp in components {
        if comp.ports.is_empty() {
            return Err(GraphError::NoPorts { comp: comp.id }.into());
        }

        // Each port must reference this component, and port names must be
        // unique within each kind (two outlets may not both be "vapor").
        let mut seen: HashMap<(PortKindKey, &str), ()> = HashMap::new();
        for &port_id in &comp.ports {
            if port_id.index() as usize >= ports.len() {
                return Err(GraphError::InvalidCompRef {
                    port: port_id,
                    comp: comp.id,
                }
                .into());
            }
            let port = &ports[port_id.index() as usize];
            if port.comp != comp.id {
                return Err(GraphError::PortCompMismatch {
                    port: port_id,
                    expected: comp.id,
                    actual: port.comp,
                }
                .into());
            }
            let key = (PortKindKey::from(port.kind), port.name.as_str());
            if seen.insert(key, ()).is_some() {
                return Err(GraphError::DuplicatePortName {
                    comp: comp.id,
                    name: port.name.clone(),
                }
                .into());
            }
        }
    }

    Ok(())
}

#[derive(PartialEq, Eq, Hash)]
enum PortKindKey {
    Inlet,
    Outlet,
}

impl From<PortKind> for PortKindKey {
    fn from(kind: PortKind) -> Self {
        match kind {
            PortKind::Inlet => PortKindKey::Inlet,
            PortKind::Outlet => PortKindKey::Outlet,
        }
    }
}

/// Validate adjacency lists for consistency.
pub(crate) fn validate_adjacency(
    nodes: &[Node],
    ports: &[Port],
    node_port_offsets: &[usize],
    node_ports: &[PortId],
) -> TfResult<()> {
    // Check that offsets array has correct length (nodes.len() + 1)
    if node_port_offsets.len() != nodes.len() + 1 {
        return Err(GraphError::InconsistentAdjacency {
            port: PortId::from_index(0),
            node: nodes.first().map_or(NodeId::from_index(0), |n| n.id),
        }
        .into());
    }

    // For each node, validate its adjacency list
    for node in nodes {
        let idx = node.id.index() as usize;
        let start = node_port_offsets[idx];
        let end = node_port_offsets[idx + 1];

        for &port_id in &node_ports[start..end] {
            // Port must exist
            if port_id.index() as usize >= ports.len() {
                return Err(GraphError::InconsistentAdjacency {
                    port: port_id,
                    node: node.id,
                }
                .into());
            }

            // Port must reference this node
            let port = &ports[port_id.index() as usize];
            if port.node != node.id {
                return Err(GraphError::InconsistentAdjacency {
                    port: port_id,
                    node: node.id,
                }
                .into());
            }
        }
    }

    // Check that all ports appear in exactly one node's adjacency list
    let mut ports_in_adj: HashSet<PortId> = HashSet::new();
    for &port_id in node_ports {
        if !ports_in_adj.insert(port_id) {
            // Duplicate port in adjacency lists
            return Err(GraphError::InconsistentAdjacency {
                port: port_id,
                node: ports[port_id.index() as usize].node,
            }
            .into());
        }
    }

    // Every port should appear
    for port in ports {
        if !ports_in_adj.contains(&port.id) {
            return Err(GraphError::InconsistentAdjacency {
                port: port.id,
                node: port.node,
            }
            .into());
        }
    }

    Ok(())
}
