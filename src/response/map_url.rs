use std::fmt::Display;

use crate::track::TrackPoint;

/// Query-string builder for the map page.
///
/// Coordinate pairs are written as repeated `ll=<lat>,<lon>` parameters in
/// trace order, four decimals each. Free-text values are percent-encoded.
pub struct MapUrl {
    url: String,
    params: usize,
}

impl MapUrl {
    pub fn new(base: &str) -> Self {
        Self {
            url: base.to_string(),
            params: 0,
        }
    }

    fn key(&mut self, key: &str) {
        let separator = if self.params == 0 && !self.url.contains('?') {
            '?'
        } else {
            '&'
        };
        self.url.push(separator);
        self.url.push_str(key);
        self.url.push('=');
        self.params += 1;
    }

    /// Percent-encoded free text.
    pub fn text(&mut self, key: &str, value: &str) -> &mut Self {
        self.key(key);
        self.url.push_str(&urlencoding::encode(value));
        self
    }

    /// A value with no characters needing escape (integers, formatted floats).
    pub fn raw(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.key(key);
        self.url.push_str(&value.to_string());
        self
    }

    pub fn fixed(&mut self, key: &str, value: f64) -> &mut Self {
        self.raw(key, format!("{:.2}", value))
    }

    pub fn coords(&mut self, key: &str, latitude: f64, longitude: f64) -> &mut Self {
        self.raw(key, format!("{:.4},{:.4}", latitude, longitude))
    }

    /// Fields of one point fix under a one-letter prefix (`m` mention, `r` response).
    pub fn fix(&mut self, prefix: char, point: &TrackPoint, timestamp: i64) -> &mut Self {
        self.coords(&format!("{prefix}l"), point.latitude, point.longitude)
            .fixed(&format!("{prefix}a"), point.altitude.unwrap_or_default())
            .fixed(&format!("{prefix}s"), point.speed.unwrap_or_default())
            .fixed(&format!("{prefix}h"), point.heading.unwrap_or_default())
            .raw(&format!("{prefix}t"), timestamp);

        if let Some(visibility) = &point.visibility {
            self.raw(&format!("{prefix}i"), visibility.illumination)
                .fixed(&format!("{prefix}e"), visibility.elevation)
                .fixed(&format!("{prefix}z"), visibility.azimuth)
                .fixed(&format!("{prefix}o"), visibility.solar_elevation);
        }
        self
    }

    pub fn build(&self) -> String {
        self.url.clone()
    }
}
