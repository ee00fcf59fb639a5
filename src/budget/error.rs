use thiserror::Error;

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("budget I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("budget YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("budget file {path} is locked by another run (pid {pid})")]
    Locked { path: String, pid: u32 },
    #[error("could not acquire budget lock at {0}")]
    LockUnavailable(String),
}
