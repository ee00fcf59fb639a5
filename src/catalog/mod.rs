mod catalog;
mod error;
mod tle_loader;

pub use catalog::SatelliteCatalog;
pub use tle_loader::element_set_identifier;
