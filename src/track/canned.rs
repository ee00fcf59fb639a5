use std::cell::RefCell;

use crate::track::error::TrackError;
use crate::track::types::{Attribute, PropagationQuery, TimeSpec};
use crate::track::PropagationPort;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub elements: String,
    pub time: TimeSpec,
    pub observer: Option<(f64, f64)>,
    pub attributes: Vec<Attribute>,
}

/// Test double returning fixed CSV instead of running a propagator.
pub struct CannedPropagator {
    trace: String,
    /// lat, lon, altitude, velocity, heading, shadow, elevation, azimuth, solarelev
    point: [f64; 9],
    fail_points: bool,
    queries: RefCell<Vec<RecordedQuery>>,
}

impl CannedPropagator {
    pub fn new(trace: &str, point: [f64; 9]) -> Self {
        Self {
            trace: trace.to_string(),
            point,
            fail_points: false,
            queries: RefCell::new(Vec::new()),
        }
    }

    /// Point queries produce empty output.
    pub fn failing_points(mut self) -> Self {
        self.fail_points = true;
        self
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.borrow().clone()
    }
}

impl PropagationPort for CannedPropagator {
    fn run(&self, query: &PropagationQuery<'_>) -> Result<String, TrackError> {
        self.queries.borrow_mut().push(RecordedQuery {
            elements: query.elements.to_string(),
            time: query.time.clone(),
            observer: query.observer,
            attributes: query.attributes.clone(),
        });

        match query.time {
            TimeSpec::Trace { .. } => Ok(self.trace.clone()),
            TimeSpec::Point { .. } if self.fail_points => Ok(String::new()),
            TimeSpec::Point { .. } => {
                let fields: Vec<String> = std::iter::once("0".to_string())
                    .chain(
                        self.point[..2 + query.attributes.len()]
                            .iter()
                            .map(|v| v.to_string()),
                    )
                    .collect();
                Ok(format!("{}\n", fields.join(",")))
            }
        }
    }
}
