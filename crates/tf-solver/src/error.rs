//! Error types for flowsheet solving.

use tf_core::error::TfError;
use thiserror::Error;

/// Errors that can occur while solving a flowsheet.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Unit op error: {0}")]
    UnitOp(#[from] tf_unitops::UnitOpError),

    #[error("Thermo error: {0}")]
    Thermo(#[from] tf_thermo::ThermoError),

    #[error("Graph error: {0}")]
    Graph(#[from] tf_graph::GraphError),

    #[error("Invalid flowsheet: {what}")]
    InvalidFlowsheet { what: String },

    #[error("Invalid parameters for unit {unit_id}: {message}")]
    InvalidParameters { unit_id: String, message: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for TfError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::UnitOp(_) => TfError::InvalidArg { what: "unit op" },
            SolverError::Thermo(_) => TfError::InvalidArg { what: "thermo" },
            SolverError::Graph(_) => TfError::InvalidArg { what: "graph" },
            SolverError::InvalidFlowsheet { what: _ } => TfError::InvalidArg { what: "flowsheet" },
            SolverError::InvalidParameters { .. } => TfError::InvalidArg { what: "unit parameters" },
        }
    }
}
