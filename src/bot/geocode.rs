use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::bot::error::TransportError;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoMatch {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

/// Resolves free-text place names.
pub trait Geocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeoMatch>, TransportError>;
}

#[derive(Debug, Clone, Deserialize)]
struct GazetteerEntry {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Offline geocoder backed by a list of named places.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    entries: Vec<GazetteerEntry>,
}

impl Gazetteer {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, TransportError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, TransportError> {
        if yaml.trim().is_empty() {
            return Ok(Self::empty());
        }
        Ok(Self {
            entries: serde_yaml::from_str(yaml)?,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Geocoder for Gazetteer {
    fn geocode(&self, query: &str) -> Result<Option<GeoMatch>, TransportError> {
        let query = query.trim();
        let hit = self.entries.iter().find(|entry| {
            std::iter::once(&entry.name)
                .chain(&entry.aliases)
                .any(|name| name.eq_ignore_ascii_case(query))
        });
        Ok(hit.map(|entry| GeoMatch {
            latitude: entry.latitude,
            longitude: entry.longitude,
            label: entry.name.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_or_alias() {
        let gazetteer = Gazetteer::from_yaml(
            "- name: New York\n  latitude: 40.71\n  longitude: -74.0\n  aliases: [NYC, Big Apple]\n",
        )
        .unwrap();
        assert_eq!(gazetteer.len(), 1);
        assert_eq!(
            gazetteer.geocode(" nyc ").unwrap(),
            Some(GeoMatch {
                latitude: 40.71,
                longitude: -74.0,
                label: "New York".to_string()
            })
        );
        assert_eq!(gazetteer.geocode("new york").unwrap().unwrap().label, "New York");
        assert_eq!(gazetteer.geocode("Atlantis").unwrap(), None);
    }

    #[test]
    fn empty_source() {
        assert_eq!(Gazetteer::from_yaml("").unwrap().len(), 0);
        assert_eq!(Gazetteer::empty().geocode("anywhere").unwrap(), None);
    }
}
