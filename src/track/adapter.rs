use std::time::Duration;

use crate::parser::Observer;
use crate::track::error::TrackError;
use crate::track::types::{Attribute, PropagationQuery, TimeSpec, TrackPoint, Visibility};
use crate::track::PropagationPort;

/// Builds propagation queries and turns the tabular output into track points.
pub struct TrackAdapter<P> {
    port: P,
    trace_interval: Duration,
}

impl<P: PropagationPort> TrackAdapter<P> {
    pub fn new(port: P, trace_interval: Duration) -> Self {
        Self {
            port,
            trace_interval,
        }
    }

    #[cfg(test)]
    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn run(
        &self,
        elements: &str,
        time: TimeSpec,
        observer: Option<&Observer>,
        attributes: &[Attribute],
    ) -> Result<Vec<TrackPoint>, TrackError> {
        let query = PropagationQuery {
            elements,
            time,
            observer: observer.map(|o| (o.latitude, o.longitude)),
            attributes: attributes.to_vec(),
        };
        let output = self.port.run(&query)?;
        parse_records(&output, attributes)
    }

    /// Positions sampled every trace interval from `start` to `end`.
    pub fn trace(&self, elements: &str, start: i64, end: i64) -> Result<Vec<TrackPoint>, TrackError> {
        let time = TimeSpec::Trace {
            start,
            end,
            interval: self.trace_interval,
        };
        self.run(elements, time, None, &[])
    }

    /// A single fix with motion and, given an observer, visibility.
    pub fn point(
        &self,
        elements: &str,
        at: i64,
        observer: Option<&Observer>,
    ) -> Result<TrackPoint, TrackError> {
        let mut attributes = Attribute::MOTION.to_vec();
        if observer.is_some() {
            attributes.extend(Attribute::OBSERVATION);
        }
        self.run(elements, TimeSpec::Point { at }, observer, &attributes)?
            .into_iter()
            .next()
            .ok_or(TrackError::EmptyOutput)
    }
}

/// Split propagator output into records. Field 0 is the record index, fields
/// 1-2 latitude and longitude, then one field per requested attribute.
fn parse_records(output: &str, attributes: &[Attribute]) -> Result<Vec<TrackPoint>, TrackError> {
    let expected = 3 + attributes.len();
    let mut points = Vec::new();

    let records = output.lines().map(str::trim).filter(|l| !l.is_empty());
    for (record, line) in records.enumerate() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < expected {
            return Err(TrackError::ShortRecord {
                record,
                found: fields.len(),
                expected,
            });
        }

        // `f64::from_str` takes "NaN" and "inf"; neither is a usable fix.
        let numeric = |field: usize| -> Result<f64, TrackError> {
            fields[field]
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| TrackError::NonNumeric {
                    record,
                    field,
                    value: fields[field].to_string(),
                })
        };

        numeric(0)?;
        let mut point = TrackPoint {
            latitude: numeric(1)?,
            longitude: numeric(2)?,
            ..TrackPoint::default()
        };

        let (mut shadow, mut elevation, mut azimuth, mut solar) = (None, None, None, None);
        for (i, attribute) in attributes.iter().enumerate() {
            let value = numeric(3 + i)?;
            match attribute {
                Attribute::Altitude => point.altitude = Some(value),
                Attribute::Velocity => point.speed = Some(value),
                Attribute::Heading => point.heading = Some(value),
                Attribute::Shadow => shadow = Some(value.round() as i64),
                Attribute::Elevation => elevation = Some(value),
                Attribute::Azimuth => azimuth = Some(value),
                Attribute::SolarElevation => solar = Some(value),
            }
        }

        if let (Some(illumination), Some(elevation), Some(azimuth), Some(solar_elevation)) =
            (shadow, elevation, azimuth, solar)
        {
            point.visibility = Some(Visibility {
                illumination,
                elevation,
                azimuth,
                solar_elevation,
            });
        }

        points.push(point);
    }

    if points.is_empty() {
        return Err(TrackError::EmptyOutput);
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::canned::CannedPropagator;

    fn adapter() -> TrackAdapter<CannedPropagator> {
        TrackAdapter::new(
            CannedPropagator::new(
                "0,51.0,-1.0\n1,51.2,-0.6\n2,51.4,-0.2\n",
                [51.5, -0.1, 420.0, 7.6, 90.0, 0.0, 35.5, 120.25, -12.0],
            ),
            Duration::from_secs(60),
        )
    }

    fn observer() -> Observer {
        Observer {
            latitude: 38.13,
            longitude: 15.37,
            name: "anoved's coordinates".to_string(),
        }
    }

    #[test]
    fn trace_records_are_positions() {
        let adapter = adapter();
        let trace = adapter.trace("ELEMENTS", 760, 1540).unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!((trace[2].latitude, trace[2].longitude), (51.4, -0.2));
        assert_eq!(trace[0].altitude, None);

        let queries = adapter.port.queries();
        assert_eq!(
            queries[0].time,
            TimeSpec::Trace {
                start: 760,
                end: 1540,
                interval: Duration::from_secs(60)
            }
        );
        assert!(queries[0].attributes.is_empty());
    }

    #[test]
    fn point_without_observer_has_no_visibility() {
        let adapter = adapter();
        let point = adapter.point("ELEMENTS", 1000, None).unwrap();
        assert_eq!(point.altitude, Some(420.0));
        assert_eq!(point.speed, Some(7.6));
        assert_eq!(point.heading, Some(90.0));
        assert_eq!(point.visibility, None);
        assert_eq!(adapter.port.queries()[0].attributes, Attribute::MOTION.to_vec());
    }

    #[test]
    fn point_with_observer_requests_visibility() {
        let adapter = adapter();
        let point = adapter.point("ELEMENTS", 1000, Some(&observer())).unwrap();
        let visibility = point.visibility.unwrap();
        assert_eq!(visibility.illumination, 0);
        assert_eq!(visibility.elevation, 35.5);
        assert_eq!(visibility.solar_elevation, -12.0);

        let query = &adapter.port.queries()[0];
        assert_eq!(query.observer, Some((38.13, 15.37)));
        assert_eq!(query.attributes.len(), 7);
    }

    #[test]
    fn malformed_output_is_rejected() {
        assert!(matches!(
            parse_records("", &[]),
            Err(TrackError::EmptyOutput)
        ));
        assert!(matches!(
            parse_records("0,51.5,-0.1,420\n", &Attribute::MOTION),
            Err(TrackError::ShortRecord {
                record: 0,
                found: 4,
                expected: 6
            })
        ));
        assert!(matches!(
            parse_records("0,51.5,west\n", &[]),
            Err(TrackError::NonNumeric { field: 2, .. })
        ));
        assert!(matches!(
            parse_records("0,NaN,inf,1,2,3\n", &Attribute::MOTION),
            Err(TrackError::NonNumeric { field: 1, .. })
        ));
        assert!(matches!(
            parse_records("0,51.5,-0.1,420,infinity,90\n", &Attribute::MOTION),
            Err(TrackError::NonNumeric { field: 4, .. })
        ));
    }

    #[test]
    fn query_arguments() {
        let query = PropagationQuery {
            elements: "L1\nL2",
            time: TimeSpec::Point { at: 1334872442 },
            observer: Some((38.5, -15.25)),
            attributes: vec![Attribute::Altitude, Attribute::SolarElevation],
        };
        assert_eq!(
            query.to_args(),
            [
                "--tle", "L1\nL2", "--format", "csv", "--start", "1334872442", "--steps", "1",
                "--observer", "38.5", "-15.25", "--attributes", "altitude", "solarelev"
            ]
        );

        let trace = PropagationQuery {
            elements: "L1\nL2",
            time: TimeSpec::Trace {
                start: 1,
                end: 2,
                interval: Duration::from_secs(60),
            },
            observer: None,
            attributes: Vec::new(),
        };
        let args = trace.to_args();
        assert_eq!(&args[4..], ["--start", "1", "--end", "2", "--interval", "1m"]);
    }
}
