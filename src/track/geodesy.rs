// WGS-84 constants
const EQUATORIAL_RADIUS_KM: f64 = 6378.137;
const ECCENTRICITY_SQ: f64 = 0.00669437999014;
const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;
const AU_KM: f64 = 149_597_870.7;

/// A point on the ellipsoid surface.
#[derive(Debug, Clone, Copy)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl GroundStation {
    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let n = EQUATORIAL_RADIUS_KM / (1.0 - ECCENTRICITY_SQ * lat.sin() * lat.sin()).sqrt();
        [
            n * lat.cos() * lon.cos(),
            n * lat.cos() * lon.sin(),
            n * (1.0 - ECCENTRICITY_SQ) * lat.sin(),
        ]
    }

    /// Azimuth and elevation (degrees) of an ECEF target seen from here.
    pub fn look_angles(&self, target_ecef: [f64; 3]) -> (f64, f64) {
        let sta = self.position_ecef_km();
        let dr = sub(target_ecef, sta);
        let range = norm(dr);
        let (east, north, up) = ecef_to_enu(dr, self.lat_rad(), self.lon_rad());
        let azimuth = east.atan2(north).to_degrees().rem_euclid(360.0);
        let elevation = if range > 0.0 {
            (up / range).asin().to_degrees()
        } else {
            0.0
        };
        (azimuth, elevation)
    }
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = teme_to_ecef_position(vel_teme, gmst);
    let rotation = [
        -EARTH_ROTATION_RAD_S * pos[1],
        EARTH_ROTATION_RAD_S * pos[0],
        0.0,
    ];
    sub(rotated, rotation)
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// Geodetic latitude, longitude (degrees) and height (km) of an ECEF position.
pub fn ecef_to_geodetic(pos: [f64; 3]) -> (f64, f64, f64) {
    let p = pos[0].hypot(pos[1]);
    let lon = pos[1].atan2(pos[0]);
    let mut lat = pos[2].atan2(p * (1.0 - ECCENTRICITY_SQ));
    let mut height = 0.0;
    for _ in 0..6 {
        let n = EQUATORIAL_RADIUS_KM / (1.0 - ECCENTRICITY_SQ * lat.sin() * lat.sin()).sqrt();
        height = p / lat.cos() - n;
        lat = pos[2].atan2(p * (1.0 - ECCENTRICITY_SQ * n / (n + height)));
    }
    (lat.to_degrees(), lon.to_degrees(), height)
}

/// Low-precision solar position in the equatorial (TEME-aligned) frame, km.
pub fn sun_position_eci_km(unix_seconds: i64) -> [f64; 3] {
    let days = unix_seconds as f64 / 86400.0 + 2440587.5 - 2451545.0;
    let mean_longitude = (280.460 + 0.9856474 * days).to_radians();
    let mean_anomaly = (357.528 + 0.9856003 * days).to_radians();
    let ecliptic_longitude = mean_longitude
        + 1.915_f64.to_radians() * mean_anomaly.sin()
        + 0.020_f64.to_radians() * (2.0 * mean_anomaly).sin();
    let obliquity = (23.439 - 0.000_000_4 * days).to_radians();
    [
        AU_KM * ecliptic_longitude.cos(),
        AU_KM * obliquity.cos() * ecliptic_longitude.sin(),
        AU_KM * obliquity.sin() * ecliptic_longitude.sin(),
    ]
}

/// Cylindrical Earth shadow test: 1 when eclipsed, 0 when sunlit.
pub fn shadow_code(sat_eci: [f64; 3], sun_eci: [f64; 3]) -> i64 {
    let sun_dir = scale(sun_eci, 1.0 / norm(sun_eci));
    let along = dot(sat_eci, sun_dir);
    let perpendicular = norm(sub(sat_eci, scale(sun_dir, along)));
    if along < 0.0 && perpendicular < EQUATORIAL_RADIUS_KM {
        1
    } else {
        0
    }
}

pub fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(v: [f64; 3], k: f64) -> [f64; 3] {
    [v[0] * k, v[1] * k, v[2] * k]
}
