use thiserror::Error;

pub type UnitOpResult<T> = Result<T, UnitOpError>;

#[derive(Error, Debug, Clone)]
pub enum UnitOpError {
    #[error("unit op '{0}' has no inlet streams")]
    NoInlets(String),

    #[error("unit op '{0}' references unknown component '{1}'")]
    UnknownComponent(String, String),

    #[error("unit op '{0}': {1}")]
    Invalid(String, &'static str),

    #[error(transparent)]
    Thermo(#[from] tf_thermo::ThermoError),
}
