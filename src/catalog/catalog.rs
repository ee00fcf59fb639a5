use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::error::CatalogError;

/// On-disk shape of the catalog: alternate names and canonical element sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    alias: BTreeMap<String, String>,
    #[serde(default)]
    tle: BTreeMap<String, String>,
}

/// Satellite names and the element sets handed to the propagator.
///
/// Aliases are expanded at load time into synthetic entries that share the
/// canonical element data, so name matching iterates one flat list.
pub struct SatelliteCatalog {
    path: PathBuf,
    file: CatalogFile,
    expanded: BTreeMap<String, String>,
}

impl SatelliteCatalog {
    /// Load the catalog at `path`. A missing file yields an empty catalog.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let file = if path.exists() {
            let content = fs::read_to_string(&path)?;
            parse_file(&content)?
        } else {
            log::warn!("Catalog {} not found, starting empty", path.display());
            CatalogFile::default()
        };
        Ok(Self::from_file(path, file))
    }

    #[cfg(test)]
    pub fn from_yaml(path: impl Into<PathBuf>, yaml: &str) -> Result<Self, CatalogError> {
        Ok(Self::from_file(path.into(), parse_file(yaml)?))
    }

    fn from_file(path: PathBuf, file: CatalogFile) -> Self {
        let mut catalog = Self {
            path,
            file,
            expanded: BTreeMap::new(),
        };
        catalog.expand();
        catalog
    }

    fn expand(&mut self) {
        self.expanded = self.file.tle.clone();
        for (alias, canonical) in &self.file.alias {
            match self.file.tle.get(canonical) {
                Some(elements) => {
                    self.expanded.insert(alias.clone(), elements.clone());
                }
                None => log::debug!("Alias {} points at missing entry {}", alias, canonical),
            }
        }
    }

    /// Element data for a canonical name or alias, `None` if unknown.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let key = self.file.alias.get(name).map(String::as_str).unwrap_or(name);
        self.file.tle.get(key).map(String::as_str)
    }

    /// Every matchable name, canonical and alias alike, in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.expanded.keys().map(String::as_str)
    }

    pub fn canonical_count(&self) -> usize {
        self.file.tle.len()
    }

    pub fn alias_count(&self) -> usize {
        self.file.alias.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Assign element data. Assigning through an alias updates its canonical
    /// entry; an unknown key becomes a new canonical entry.
    pub fn insert(&mut self, key: &str, elements: String) {
        let canonical = self
            .file
            .alias
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string());
        self.file.tle.insert(canonical, elements);
        self.expand();
    }

    /// Delete a canonical entry. Aliases pointing at it stay but resolve to nothing.
    pub fn remove(&mut self, canonical: &str) -> Option<String> {
        let removed = self.file.tle.remove(canonical);
        self.expand();
        removed
    }

    pub fn add_alias(&mut self, alias: &str, canonical: &str) -> Result<(), CatalogError> {
        if self.file.alias.contains_key(canonical) {
            return Err(CatalogError::AliasChain {
                alias: alias.to_string(),
                target: canonical.to_string(),
            });
        }
        if !self.file.tle.contains_key(canonical) {
            return Err(CatalogError::UnknownSatellite(canonical.to_string()));
        }
        if self.file.tle.contains_key(alias) {
            return Err(CatalogError::AliasShadowsEntry(alias.to_string()));
        }
        self.file
            .alias
            .insert(alias.to_string(), canonical.to_string());
        self.expand();
        Ok(())
    }

    pub fn save(&self) -> Result<(), CatalogError> {
        self.export(&self.path)
    }

    pub fn export(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_yaml::to_string(&self.file)?)?;
        Ok(())
    }
}

fn parse_file(content: &str) -> Result<CatalogFile, CatalogError> {
    if content.trim().is_empty() {
        return Ok(CatalogFile::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS: &str = "1 25544U 98067A   12110.89270833  .00016717  00000-0  10270-3 0  9005\n2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    fn sample() -> SatelliteCatalog {
        let yaml = format!(
            "alias:\n  International Space Station: ISS\n  ZARYA: ISS\n  Ghost: MISSING\ntle:\n  ISS: \"{}\"\n  LANDSAT 5: \"1 14780U\"\n",
            ISS.replace('\n', "\\n")
        );
        SatelliteCatalog::from_yaml("catalog.yml", &yaml).unwrap()
    }

    #[test]
    fn aliases_resolve_to_canonical_elements() {
        let catalog = sample();
        for alias in ["International Space Station", "ZARYA"] {
            assert_eq!(catalog.resolve(alias), catalog.resolve("ISS"));
        }
        assert_eq!(catalog.resolve("ISS"), Some(ISS));
    }

    #[test]
    fn dangling_alias_and_unknown_name_are_not_found() {
        let catalog = sample();
        assert_eq!(catalog.resolve("Ghost"), None);
        assert_eq!(catalog.resolve("HUBBLE"), None);
    }

    #[test]
    fn entries_include_expanded_aliases_only_when_target_exists() {
        let catalog = sample();
        let names: Vec<_> = catalog.entries().collect();
        assert!(names.contains(&"ZARYA"));
        assert!(names.contains(&"LANDSAT 5"));
        assert!(!names.contains(&"Ghost"));
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn insert_through_alias_updates_canonical() {
        let mut catalog = sample();
        catalog.insert("ZARYA", "new elements".to_string());
        assert_eq!(catalog.resolve("ISS"), Some("new elements"));
        assert_eq!(catalog.canonical_count(), 2);
    }

    #[test]
    fn alias_chains_are_rejected() {
        let mut catalog = sample();
        let err = catalog.add_alias("Station", "ZARYA").unwrap_err();
        assert!(matches!(err, CatalogError::AliasChain { .. }));
        let err = catalog.add_alias("Station", "HUBBLE").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownSatellite(_)));
        catalog.add_alias("Station", "ISS").unwrap();
        assert_eq!(catalog.resolve("Station"), Some(ISS));
    }

    #[test]
    fn alias_cannot_shadow_canonical_entry() {
        let mut catalog = sample();
        let err = catalog.add_alias("LANDSAT 5", "ISS").unwrap_err();
        assert!(matches!(err, CatalogError::AliasShadowsEntry(ref name) if name == "LANDSAT 5"));
        assert_eq!(catalog.resolve("LANDSAT 5"), Some("1 14780U"));
        assert_eq!(catalog.alias_count(), 3);
    }

    #[test]
    fn remove_leaves_alias_dangling() {
        let mut catalog = sample();
        assert!(catalog.remove("ISS").is_some());
        assert_eq!(catalog.resolve("ZARYA"), None);
        assert!(!catalog.entries().any(|n| n == "ZARYA"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("catalog.yml");
        let mut catalog = SatelliteCatalog::load(&path).unwrap();
        assert_eq!(catalog.canonical_count(), 0);

        catalog.insert("ISS", ISS.to_string());
        catalog.add_alias("ZARYA", "ISS").unwrap();
        catalog.save().unwrap();

        let reloaded = SatelliteCatalog::load(&path).unwrap();
        assert_eq!(reloaded.file, catalog.file);
        assert_eq!(reloaded.resolve("ZARYA"), Some(ISS));
    }
}
