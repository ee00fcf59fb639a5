mod name;
mod place_tag;
mod time_tag;
mod types;

pub use name::NameMatcher;
pub use place_tag::parse_place_tag;
pub use time_tag::parse_time_tag;
pub use types::{Observer, ParsedMention};

use crate::bot::{Geocoder, Message, TransportError};

/// Interpret one message: which satellite, when, and from where.
///
/// Returns `Ok(None)` when no candidate name appears in the text. Only the
/// first matching name is answered.
pub fn parse_mention(
    message: &Message,
    matcher: &NameMatcher,
    geocoder: &dyn Geocoder,
) -> Result<Option<ParsedMention>, TransportError> {
    let Some(satellite) = matcher.find(&message.text) else {
        return Ok(None);
    };

    let (timestamp, explicit_time) = parse_time_tag(&message.text, message.timestamp);
    let observer = parse_place_tag(message, geocoder)?;

    Ok(Some(ParsedMention {
        satellite: satellite.to_string(),
        timestamp,
        explicit_time,
        observer,
    }))
}
