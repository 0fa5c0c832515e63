//! Graph-specific error types.

use tf_core::{CompId, NodeId, PortId, TfError};

/// Graph construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A port refers to a node that doesn't exist.
    InvalidNodeRef { port: PortId, node: NodeId },

    /// A port refers to a component that doesn't exist.
    InvalidCompRef { port: PortId, comp: CompId },

    /// A component has no ports at all.
    NoPorts { comp: CompId },

    /// A component has two ports of the same kind sharing a name.
    DuplicatePortName { comp: CompId, name: String },

    /// A port's component field doesn't match the component containing it.
    PortCompMismatch {
        port: PortId,
        expected: CompId,
        actual: CompId,
    },

    /// Adjacency list is inconsistent (port in node's list but port doesn't reference node).
    InconsistentAdjacency { port: PortId, node: NodeId },

    /// ID not found in index map.
    IdNotFound { what: &'static str },

    /// A connection endpoint names a unit that was never added to the graph.
    UnknownUnit { unit_id: String },

    /// A connection endpoint names a port not present on that unit.
    UnknownPort { unit_id: String, port: String },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidNodeRef { port, node } => {
                write!(f, "Port {} refers to non-existent node {}", port, node)
            }
            GraphError::InvalidCompRef { port, comp } => {
                write!(f, "Port {} refers to non-existent component {}", port, comp)
            }
            GraphError::NoPorts { comp } => {
                write!(f, "Component {} has no ports", comp)
            }
            GraphError::DuplicatePortName { comp, name } => {
                write!(f, "Component {} has duplicate port name '{}'", comp, name)
            }
            GraphError::PortCompMismatch {
                port,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Port {} should belong to component {} but references {}",
                    port, expected, actual
                )
            }
            GraphError::InconsistentAdjacency { port, node } => {
                write!(
                    f,
                    "Port {} in node {}'s adjacency list but doesn't reference that node",
                    port, node
                )
            }
            GraphError::IdNotFound { what } => {
                write!(f, "{} not found in index map", what)
            }
            GraphError::UnknownUnit { unit_id } => {
                write!(f, "connection references unknown unit '{}'", unit_id)
            }
            GraphError::UnknownPort { unit_id, port } => {
                write!(f, "unit '{}' has no port named '{}'", unit_id, port)
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for TfError {
    fn from(err: GraphError) -> Self {
        TfError::Invariant {
            what: Box::leak(err.to_string().into_boxed_str()),
        }
    }
}
