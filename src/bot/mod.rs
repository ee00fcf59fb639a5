mod error;
mod geocode;
mod message;
mod orchestrator;
mod transport;
mod watermark;

pub use error::TransportError;
pub use geocode::{Gazetteer, Geocoder};
#[cfg(test)]
pub use message::GeoPoint;
pub use message::{Message, Place};
pub use orchestrator::{BotSettings, Orchestrator};
pub use transport::SpoolTransport;
pub use watermark::Watermarks;
