mod adapter;
#[cfg(test)]
pub(crate) mod canned;
mod error;
mod geodesy;
mod process;
mod propagation;
mod types;

pub use adapter::TrackAdapter;
pub use error::TrackError;
pub use process::ProcessPropagator;
pub use propagation::Sgp4Propagator;
pub use types::{PropagationQuery, TrackPoint};
#[cfg(test)]
pub use types::{TimeSpec, Visibility};

/// Runs one propagation query and returns the raw CSV text it produced.
pub trait PropagationPort {
    fn run(&self, query: &PropagationQuery<'_>) -> Result<String, TrackError>;
}

impl<P: PropagationPort + ?Sized> PropagationPort for Box<P> {
    fn run(&self, query: &PropagationQuery<'_>) -> Result<String, TrackError> {
        (**self).run(query)
    }
}
