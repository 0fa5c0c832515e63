//! tf-graph: flowsheet graph/model layer.
//!
//! Provides:
//! - Core graph data structures (Node, Component, Port, Graph) with a
//!   variable number of named ports per component, generalizing the
//!   bootstrap repo's fixed-2-port model.
//! - Incremental graph builder with validation.
//! - Stable indexing for solver integration.
//! - Connection/port-alias resolution for payload-supplied handles.
//!
//! # Example
//!
//! ```
//! use tf_graph::GraphBuilder;
//!
//! let mut builder = GraphBuilder::new();
//! let n1 = builder.add_node("feed");
//! let n2 = builder.add_node("out");
//! let c1 = builder.add_component("pump-1", "Pump", &[("in", n1)], &[("out", n2)]);
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.nodes().len(), 2);
//! assert_eq!(graph.components().len(), 1);
//! assert_eq!(graph.component(c1).unwrap().ports.len(), 2);
//! ```

pub mod alias;
pub mod builder;
pub mod connection;
pub mod error;
pub mod graph;
pub mod indexing;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use alias::{default_inlet_ports, default_outlet_ports, extract_port, outlet_key_to_port};
pub use builder::GraphBuilder;
pub use connection::{build_connection, Connection, DefaultPortAssigner};
pub use error::GraphError;
pub use graph::{Component, Graph, Node, Port, PortKind};
pub use indexing::IndexMap;
