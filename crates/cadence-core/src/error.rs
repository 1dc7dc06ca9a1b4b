use thiserror::Error;

#[derive(Debug, Error)]
pub enum CadenceError {
    #[error("binding table is frozen: bindings must be registered before the first tick")]
    TableFrozen,

    #[error("unknown routine: {0}")]
    UnknownRoutine(String),

    #[error("invalid alliance '{0}': expected 'blue' or 'red'")]
    InvalidAlliance(String),

    #[error("invalid subsystem group: {0}")]
    InvalidGroup(String),

    #[error("invalid elevator setpoint: {0}")]
    InvalidSetpoint(String),

    #[error("invalid branch side '{0}': expected 'left' or 'right'")]
    InvalidBranchSide(String),

    #[error("no default behavior registered for group {0}")]
    MissingDefault(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CadenceError>;
