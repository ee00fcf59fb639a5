use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("gazetteer YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed message {id}: {reason}")]
    Malformed { id: u64, reason: String },
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
