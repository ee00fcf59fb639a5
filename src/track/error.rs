use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to start propagator {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("propagator I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("propagator timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("propagator exited with status {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },
    #[error("propagator produced no records")]
    EmptyOutput,
    #[error("record {record} has {found} fields, expected at least {expected}")]
    ShortRecord {
        record: usize,
        found: usize,
        expected: usize,
    },
    #[error("record {record} field {field} is not numeric: {value:?}")]
    NonNumeric {
        record: usize,
        field: usize,
        value: String,
    },
    #[error("invalid element set: {0}")]
    Elements(String),
    #[error("propagation error: {0}")]
    Propagation(String),
    #[error("attribute {0} requires an observer")]
    MissingObserver(&'static str),
}
