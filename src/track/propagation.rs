use std::fmt::Write as _;

use chrono::DateTime;
use sgp4::{Constants, Elements};

use crate::track::error::TrackError;
use crate::track::geodesy::{
    ecef_to_enu, ecef_to_geodetic, norm, shadow_code, sun_position_eci_km, teme_to_ecef_position,
    teme_to_ecef_velocity, GroundStation,
};
use crate::track::types::{Attribute, PropagationQuery};
use crate::track::PropagationPort;

/// In-process SGP4 propagation producing the same CSV records as the
/// external generator, for hosts without the binary.
pub struct Sgp4Propagator;

impl PropagationPort for Sgp4Propagator {
    fn run(&self, query: &PropagationQuery<'_>) -> Result<String, TrackError> {
        let (name, line1, line2) = parse_tle_lines(query.elements)?;
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| TrackError::Elements(e.to_string()))?;
        let constants =
            Constants::from_elements(&elements).map_err(|e| TrackError::Elements(e.to_string()))?;
        let station = query.observer.map(|(lat, lon)| GroundStation {
            latitude_deg: lat,
            longitude_deg: lon,
        });

        let mut output = String::new();
        for (index, at) in query.time.instants().into_iter().enumerate() {
            let fix = propagate_fix(&elements, &constants, at)?;
            let mut fields = vec![
                index.to_string(),
                format!("{:.6}", fix.latitude),
                format!("{:.6}", fix.longitude),
            ];
            for attribute in &query.attributes {
                fields.push(fix.attribute(*attribute, station.as_ref())?);
            }
            let _ = writeln!(output, "{}", fields.join(","));
        }
        Ok(output)
    }
}

struct Fix {
    at: i64,
    latitude: f64,
    longitude: f64,
    altitude_km: f64,
    speed_km_s: f64,
    heading_deg: f64,
    sat_eci: [f64; 3],
    sat_ecef: [f64; 3],
    gmst: f64,
}

impl Fix {
    fn attribute(
        &self,
        attribute: Attribute,
        station: Option<&GroundStation>,
    ) -> Result<String, TrackError> {
        let observed = || station.ok_or(TrackError::MissingObserver(attribute.as_str()));
        Ok(match attribute {
            Attribute::Altitude => format!("{:.6}", self.altitude_km),
            Attribute::Velocity => format!("{:.6}", self.speed_km_s),
            Attribute::Heading => format!("{:.6}", self.heading_deg),
            Attribute::Shadow => {
                shadow_code(self.sat_eci, sun_position_eci_km(self.at)).to_string()
            }
            Attribute::Elevation => format!("{:.6}", observed()?.look_angles(self.sat_ecef).1),
            Attribute::Azimuth => format!("{:.6}", observed()?.look_angles(self.sat_ecef).0),
            Attribute::SolarElevation => {
                let sun_ecef = teme_to_ecef_position(sun_position_eci_km(self.at), self.gmst);
                format!("{:.6}", observed()?.look_angles(sun_ecef).1)
            }
        })
    }
}

fn propagate_fix(elements: &Elements, constants: &Constants, at: i64) -> Result<Fix, TrackError> {
    let timestamp = DateTime::from_timestamp(at, 0)
        .ok_or_else(|| TrackError::Propagation(format!("timestamp out of range: {}", at)))?
        .naive_utc();

    let minutes = elements
        .datetime_to_minutes_since_epoch(&timestamp)
        .map_err(|e| TrackError::Propagation(e.to_string()))?;
    let prediction = constants
        .propagate(minutes)
        .map_err(|e| TrackError::Propagation(e.to_string()))?;

    let gmst = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp));
    let sat_ecef = teme_to_ecef_position(prediction.position, gmst);
    let vel_ecef = teme_to_ecef_velocity(prediction.position, prediction.velocity, gmst);

    let (latitude, longitude, altitude_km) = ecef_to_geodetic(sat_ecef);
    let (east, north, _) = ecef_to_enu(vel_ecef, latitude.to_radians(), longitude.to_radians());

    Ok(Fix {
        at,
        latitude,
        longitude,
        altitude_km,
        speed_km_s: norm(prediction.velocity),
        heading_deg: east.atan2(north).to_degrees().rem_euclid(360.0),
        sat_eci: prediction.position,
        sat_ecef,
        gmst,
    })
}

fn parse_tle_lines(tle: &str) -> Result<(Option<String>, String, String), TrackError> {
    let lines: Vec<String> = tle
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    match lines.len() {
        2 => Ok((None, lines[0].clone(), lines[1].clone())),
        3 => Ok((Some(lines[0].clone()), lines[1].clone(), lines[2].clone())),
        n => Err(TrackError::Elements(format!("expected 2 or 3 TLE lines, got {}", n))),
    }
}
