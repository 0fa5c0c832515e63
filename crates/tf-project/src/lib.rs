//! tf-project: flowsheet payload schema, I/O, and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{validate_payload, ValidationError};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<FlowsheetPayload> {
    let content = std::fs::read_to_string(path)?;
    let payload: FlowsheetPayload = serde_yaml::from_str(&content)?;
    validate_payload(&payload)?;
    Ok(payload)
}

pub fn save_yaml(path: &std::path::Path, payload: &FlowsheetPayload) -> ProjectResult<()> {
    validate_payload(payload)?;
    let content = serde_yaml::to_string(payload)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<FlowsheetPayload> {
    let content = std::fs::read_to_string(path)?;
    let payload: FlowsheetPayload = serde_json::from_str(&content)?;
    validate_payload(&payload)?;
    Ok(payload)
}

pub fn save_json(path: &std::path::Path, payload: &FlowsheetPayload) -> ProjectResult<()> {
    validate_payload(payload)?;
    let content = serde_json::to_string_pretty(payload)?;
    std::fs::write(path, content)?;
    Ok(())
}
