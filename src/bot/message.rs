use chrono::DateTime;
use serde::Deserialize;

use crate::bot::error::TransportError;

/// A mention, search result or direct message, normalised at the transport
/// boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: u64,
    pub text: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub author: String,
    pub geo: Option<GeoPoint>,
    pub place: Option<Place>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    /// Corners as `[longitude, latitude]`.
    pub bounding_box: Vec<[f64; 2]>,
}

/// Record shape as delivered by the platform. Search results name the author
/// `from_user`, direct messages `sender_screen_name`, timelines `user`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub id: u64,
    pub text: String,
    pub created_at: String,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub from_user: Option<String>,
    #[serde(default)]
    pub sender_screen_name: Option<String>,
    #[serde(default)]
    pub geo: Option<RawGeo>,
    #[serde(default)]
    pub place: Option<RawPlace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub screen_name: String,
}

/// `coordinates` is `[latitude, longitude]`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGeo {
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPlace {
    pub name: String,
    pub bounding_box: RawBoundingBox,
}

/// GeoJSON polygon: a list of rings of `[longitude, latitude]` corners.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBoundingBox {
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl TryFrom<RawMessage> for Message {
    type Error = TransportError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let malformed = |reason: &str| TransportError::Malformed {
            id: raw.id,
            reason: reason.to_string(),
        };

        let author = raw
            .user
            .as_ref()
            .map(|u| u.screen_name.clone())
            .or_else(|| raw.from_user.clone())
            .or_else(|| raw.sender_screen_name.clone())
            .ok_or_else(|| malformed("no author"))?;

        let timestamp = parse_created_at(&raw.created_at)
            .ok_or_else(|| malformed(&format!("bad timestamp {:?}", raw.created_at)))?;

        let geo = match raw.geo.as_ref().map(|g| g.coordinates.as_slice()) {
            Some([latitude, longitude, ..]) => Some(GeoPoint {
                latitude: *latitude,
                longitude: *longitude,
            }),
            Some(_) => return Err(malformed("incomplete geo coordinates")),
            None => None,
        };

        let place = raw.place.as_ref().and_then(|p| {
            p.bounding_box.coordinates.first().map(|ring| Place {
                name: p.name.clone(),
                bounding_box: ring.clone(),
            })
        });

        Ok(Message {
            id: raw.id,
            text: raw.text,
            timestamp,
            author,
            geo,
            place,
        })
    }
}

/// Accepts `Fri, 13 Apr 2012 13:06:22 +0000` (search),
/// `Fri Apr 13 13:06:22 +0000 2012` (timeline) and RFC 3339.
fn parse_created_at(created_at: &str) -> Option<i64> {
    let s = created_at.trim();
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_str(s, "%a %b %d %H:%M:%S %z %Y"))
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawMessage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn timestamps_in_every_platform_format() {
        assert_eq!(parse_created_at("Fri, 13 Apr 2012 13:06:22 +0000"), Some(1334322382));
        assert_eq!(parse_created_at("Fri Apr 13 13:06:22 +0000 2012"), Some(1334322382));
        assert_eq!(parse_created_at("2012-04-13T13:06:22Z"), Some(1334322382));
        assert_eq!(parse_created_at("yesterday"), None);
    }

    #[test]
    fn timeline_mention_with_geo() {
        let message = Message::try_from(raw(
            r#"{"id": 7, "text": "@WheresThatSat ISS", "created_at": "Fri Apr 13 13:06:22 +0000 2012",
                "user": {"screen_name": "anoved"}, "geo": {"coordinates": [38.13, 15.37]}}"#,
        ))
        .unwrap();
        assert_eq!(message.author, "anoved");
        assert_eq!(
            message.geo,
            Some(GeoPoint {
                latitude: 38.13,
                longitude: 15.37
            })
        );
        assert_eq!(message.place, None);
    }

    #[test]
    fn search_result_with_place() {
        let message = Message::try_from(raw(
            r#"{"id": 8, "text": "ISS!", "created_at": "Fri, 13 Apr 2012 13:06:22 +0000",
                "from_user": "stargazer",
                "place": {"name": "Portland, OR", "bounding_box": {"coordinates": [[[-122.8, 45.4], [-122.5, 45.4], [-122.5, 45.6], [-122.8, 45.6]]]}}}"#,
        ))
        .unwrap();
        assert_eq!(message.author, "stargazer");
        let place = message.place.unwrap();
        assert_eq!(place.name, "Portland, OR");
        assert_eq!(place.bounding_box.len(), 4);
    }

    #[test]
    fn direct_message_author_and_missing_author() {
        let message = Message::try_from(raw(
            r#"{"id": 9, "text": "HST", "created_at": "2012-04-13T13:06:22Z", "sender_screen_name": "dm_user"}"#,
        ))
        .unwrap();
        assert_eq!(message.author, "dm_user");

        let err = Message::try_from(raw(
            r#"{"id": 10, "text": "HST", "created_at": "2012-04-13T13:06:22Z"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, TransportError::Malformed { id: 10, .. }));
    }
}
