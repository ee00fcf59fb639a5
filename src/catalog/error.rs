use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TLE directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid TLE format in {file}: {message}")]
    InvalidTle { file: String, message: String },
    #[error("unknown canonical satellite: {0}")]
    UnknownSatellite(String),
    #[error("alias {alias} would point at another alias ({target})")]
    AliasChain { alias: String, target: String },
    #[error("{0} is already a canonical entry")]
    AliasShadowsEntry(String),
}
