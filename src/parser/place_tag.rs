use std::sync::LazyLock;

use regex::Regex;

use crate::bot::{Geocoder, Message, Place, TransportError};
use crate::parser::types::Observer;

static PLACE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)#place "([^"]+)""#).expect("valid place tag pattern"));

/// The quoted query of a `#place "<query>"` tag, if any.
pub fn place_tag_query(text: &str) -> Option<&str> {
    PLACE_TAG
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Work out the observer location of a message. First match wins: an
/// explicit `#place` tag, then attached point coordinates, then the centre
/// of an attached place's bounding box.
///
/// A `#place` tag that the geocoder cannot resolve yields no observer; it
/// does not fall through to the attached metadata.
pub fn parse_place_tag(
    message: &Message,
    geocoder: &dyn Geocoder,
) -> Result<Option<Observer>, TransportError> {
    if let Some(query) = place_tag_query(&message.text) {
        let observer = geocoder.geocode(query)?.map(|hit| Observer {
            latitude: hit.latitude,
            longitude: hit.longitude,
            name: format!("\"{}\"", query),
        });
        if observer.is_none() {
            log::info!("No geocode result for {:?} (message {})", query, message.id);
        }
        return Ok(observer);
    }

    if let Some(geo) = &message.geo {
        return Ok(Some(Observer {
            latitude: geo.latitude,
            longitude: geo.longitude,
            name: possessive_coordinates(&message.author),
        }));
    }

    Ok(message.place.as_ref().and_then(place_centroid))
}

fn possessive_coordinates(author: &str) -> String {
    if author.ends_with(['s', 'S']) {
        format!("{}' coordinates", author)
    } else {
        format!("{}'s coordinates", author)
    }
}

/// Midpoint of two opposite corners of the place's `[lon, lat]` bounding box.
fn place_centroid(place: &Place) -> Option<Observer> {
    let (a, c) = match place.bounding_box.as_slice() {
        [a, _, c, ..] => (a, c),
        _ => return None,
    };
    Some(Observer {
        latitude: (a[1] + c[1]) / 2.0,
        longitude: (a[0] + c[0]) / 2.0,
        name: place.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{Gazetteer, GeoPoint};

    fn message(text: &str, author: &str) -> Message {
        Message {
            id: 1,
            text: text.to_string(),
            timestamp: 0,
            author: author.to_string(),
            geo: None,
            place: None,
        }
    }

    fn gazetteer() -> Gazetteer {
        Gazetteer::from_yaml("- name: Messina\n  latitude: 38.19\n  longitude: 15.55\n").unwrap()
    }

    fn portland() -> Place {
        Place {
            name: "Portland, OR".to_string(),
            bounding_box: vec![[-122.8, 45.4], [-122.5, 45.4], [-122.5, 45.6], [-122.8, 45.6]],
        }
    }

    #[test]
    fn explicit_tag_wins_over_metadata() {
        let mut msg = message(r#"ISS #place "messina""#, "anoved");
        msg.geo = Some(GeoPoint {
            latitude: 1.0,
            longitude: 2.0,
        });
        let observer = parse_place_tag(&msg, &gazetteer()).unwrap().unwrap();
        assert_eq!(observer.name, "\"messina\"");
        assert_eq!(observer.latitude, 38.19);
    }

    #[test]
    fn unresolvable_tag_yields_no_observer() {
        let mut msg = message(r#"ISS #place "atlantis""#, "anoved");
        msg.place = Some(portland());
        assert_eq!(parse_place_tag(&msg, &gazetteer()).unwrap(), None);
    }

    #[test]
    fn point_geolocation_uses_possessive_author() {
        let mut msg = message("ISS", "anoved");
        msg.geo = Some(GeoPoint {
            latitude: 38.13,
            longitude: 15.37,
        });
        let observer = parse_place_tag(&msg, &gazetteer()).unwrap().unwrap();
        assert_eq!(observer.name, "anoved's coordinates");

        msg.author = "stars".to_string();
        let observer = parse_place_tag(&msg, &gazetteer()).unwrap().unwrap();
        assert_eq!(observer.name, "stars' coordinates");
    }

    #[test]
    fn place_bounding_box_centroid() {
        let mut msg = message("ISS", "anoved");
        msg.place = Some(portland());
        let observer = parse_place_tag(&msg, &gazetteer()).unwrap().unwrap();
        assert_eq!(observer.name, "Portland, OR");
        assert!((observer.latitude - 45.5).abs() < 1e-9);
        assert!((observer.longitude + 122.65).abs() < 1e-9);
    }

    #[test]
    fn nothing_attached() {
        assert_eq!(parse_place_tag(&message("ISS", "a"), &gazetteer()).unwrap(), None);
    }
}
