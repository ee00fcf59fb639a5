use std::time::Duration;

/// Per-record values the propagator can be asked for, beyond position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Altitude,
    Velocity,
    Heading,
    Shadow,
    Elevation,
    Azimuth,
    SolarElevation,
}

impl Attribute {
    /// Requested for every point fix.
    pub const MOTION: [Attribute; 3] = [Attribute::Altitude, Attribute::Velocity, Attribute::Heading];
    /// Requested in addition when an observer is known.
    pub const OBSERVATION: [Attribute; 4] = [
        Attribute::Shadow,
        Attribute::Elevation,
        Attribute::Azimuth,
        Attribute::SolarElevation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Altitude => "altitude",
            Attribute::Velocity => "velocity",
            Attribute::Heading => "heading",
            Attribute::Shadow => "shadow",
            Attribute::Elevation => "elevation",
            Attribute::Azimuth => "azimuth",
            Attribute::SolarElevation => "solarelev",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimeSpec {
    /// Sampled path between two instants (epoch seconds, inclusive).
    Trace {
        start: i64,
        end: i64,
        interval: Duration,
    },
    /// A single fix.
    Point { at: i64 },
}

impl TimeSpec {
    /// Every instant the query covers.
    pub fn instants(&self) -> Vec<i64> {
        match *self {
            TimeSpec::Trace {
                start,
                end,
                interval,
            } => {
                let step = interval.as_secs().max(1) as usize;
                (start..=end).step_by(step).collect()
            }
            TimeSpec::Point { at } => vec![at],
        }
    }
}

/// Everything the propagator needs for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationQuery<'a> {
    pub elements: &'a str,
    pub time: TimeSpec,
    /// Observer latitude and longitude in degrees.
    pub observer: Option<(f64, f64)>,
    pub attributes: Vec<Attribute>,
}

impl PropagationQuery<'_> {
    /// Command-line form understood by the ground track generator.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--tle".to_string(),
            self.elements.to_string(),
            "--format".to_string(),
            "csv".to_string(),
        ];

        match &self.time {
            TimeSpec::Trace {
                start,
                end,
                interval,
            } => {
                args.extend([
                    "--start".to_string(),
                    start.to_string(),
                    "--end".to_string(),
                    end.to_string(),
                    "--interval".to_string(),
                    humantime::format_duration(*interval).to_string(),
                ]);
            }
            TimeSpec::Point { at } => {
                args.extend([
                    "--start".to_string(),
                    at.to_string(),
                    "--steps".to_string(),
                    "1".to_string(),
                ]);
            }
        }

        if let Some((lat, lon)) = self.observer {
            args.extend(["--observer".to_string(), lat.to_string(), lon.to_string()]);
        }

        if !self.attributes.is_empty() {
            args.push("--attributes".to_string());
            args.extend(self.attributes.iter().map(|a| a.as_str().to_string()));
        }

        args
    }
}

/// Visibility of the satellite from a known observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
    /// Raw `shadow` code reported by the propagator (0 = sunlit).
    pub illumination: i64,
    pub elevation: f64,
    pub azimuth: f64,
    pub solar_elevation: f64,
}

/// One propagated record. Trace records only carry a position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// km
    pub altitude: Option<f64>,
    /// km/s
    pub speed: Option<f64>,
    /// degrees clockwise from north
    pub heading: Option<f64>,
    pub visibility: Option<Visibility>,
}
