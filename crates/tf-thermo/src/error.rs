use thiserror::Error;

pub type ThermoResult<T> = Result<T, ThermoError>;

#[derive(Error, Debug, Clone)]
pub enum ThermoError {
    #[error("could not resolve component '{0}' to a known registry entry")]
    UnresolvedComponent(String),

    #[error("unsupported property package '{0}'")]
    UnsupportedPackage(String),

    #[error("flash failed to converge: {0}")]
    FlashNonConvergent(&'static str),

    #[error("flash input invalid: {0}")]
    InvalidInput(&'static str),

    #[error("composition length {got} does not match component count {expected}")]
    CompositionMismatch { got: usize, expected: usize },
}
