use thiserror::Error;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Not found: {kind}/{id}")]
    NotFound { kind: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote request failed ({status}): {detail}")]
    Remote { status: u16, detail: String },

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl FolioError {
    pub(crate) fn not_found(kind: &str, id: &str) -> Self {
        FolioError::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FolioError>;
