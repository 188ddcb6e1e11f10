use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaktError {
    #[error("invalid cell name: {0}")]
    InvalidCell(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    #[error("invalid mode: {0}")]
    InvalidMode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed work item {path}: {reason}")]
    MalformedItem { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, TaktError>;
