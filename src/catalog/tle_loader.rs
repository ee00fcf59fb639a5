use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use sgp4::Elements;

use crate::catalog::catalog::SatelliteCatalog;
use crate::catalog::error::CatalogError;

static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.+?\)|\[.+?\]").expect("valid annotation pattern"));

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub duplicates: usize,
    pub failed_files: usize,
}

impl SatelliteCatalog {
    /// Import every `.tle`/`.txt` file in `dir`. Names already present in the
    /// catalog (some satellites appear in several source lists) are kept as is.
    pub fn import_tle_dir(&mut self, dir: &Path) -> Result<ImportSummary, CatalogError> {
        if !dir.exists() {
            return Err(CatalogError::DirectoryNotFound(dir.display().to_string()));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_tle = path
                .extension()
                .map(|ext| ext == "tle" || ext == "txt")
                .unwrap_or(false);
            if path.is_file() && is_tle {
                paths.push(path);
            }
        }
        paths.sort();

        let mut summary = ImportSummary::default();
        for path in paths {
            let entries = match parse_tle_file(&path) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Failed to parse TLE file {}: {}", path.display(), e);
                    summary.failed_files += 1;
                    continue;
                }
            };

            for (name, elements) in entries {
                if self.contains(&name) {
                    summary.duplicates += 1;
                    continue;
                }
                self.insert(&name, elements);
                summary.added += 1;
            }
        }

        log::info!(
            "Imported {} satellites from {} ({} duplicates, {} bad files)",
            summary.added,
            dir.display(),
            summary.duplicates,
            summary.failed_files
        );
        Ok(summary)
    }
}

/// Parse a single TLE file (may contain multiple satellites) into
/// `(catalog name, "line1\nline2")` pairs.
fn parse_tle_file(path: &Path) -> Result<Vec<(String, String)>, CatalogError> {
    let content = fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let mut results = Vec::new();
    for (name, line1, line2) in parse_multi_tle(&content) {
        let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| CatalogError::InvalidTle {
                file: filename.clone(),
                message: e.to_string(),
            })?;

        let sat_name = name
            .map(|n| clean_name(&n))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("NORAD {}", elements.norad_id));

        results.push((sat_name, format!("{}\n{}", line1, line2)));
    }

    Ok(results)
}

/// Drop alternate names and status codes, e.g. `"ISS (ZARYA) [+]"` -> `"ISS"`.
fn clean_name(raw: &str) -> String {
    let stripped = ANNOTATION.replace_all(raw, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse multi-satellite TLE content
fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}

/// The catalog number carried in columns 3-7 of TLE line 1, used as the
/// `si` map parameter.
pub fn element_set_identifier(elements: &str) -> String {
    let line1 = elements
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("1 "))
        .unwrap_or(elements);
    line1.get(2..7).unwrap_or_default().trim().to_string()
}
