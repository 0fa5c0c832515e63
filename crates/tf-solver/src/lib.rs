//! Sequential-modular flowsheet solver: recycle-tear detection plus a
//! Wegstein-accelerated fixed-point iteration over a unit-operation graph.

pub mod balance;
pub mod build;
pub mod cycle;
pub mod error;
pub mod iterate;

pub use balance::{check_energy_balance, check_mass_balance, terminal_units};
pub use build::{create_feed_stream, flowsheet_from_payload, kind_tag, unit_op_from_spec};
pub use cycle::{select_tear_streams, tarjan_scc, topological_order_with_tears};
pub use error::{SolverError, SolverResult};
pub use iterate::{solve, Flowsheet, SolveConfig, SolveReport};
