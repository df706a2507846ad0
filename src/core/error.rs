use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Resolve(String),

    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Usage(_) => "USAGE_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Resolve(_) => "RESOLVE_ERROR",
            Error::WorkspaceNotFound(_) => "WORKSPACE_NOT_FOUND",
            Error::Io(_) => "IO_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}
