use regex::{Regex, RegexBuilder};

/// Finds the first candidate satellite name mentioned in free text.
///
/// Matching is case-insensitive, bounded on words, and treats space and
/// hyphen as interchangeable, so `LANDSAT 5` matches "landsat-5".
pub struct NameMatcher {
    patterns: Vec<(String, Regex)>,
}

impl NameMatcher {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut patterns = Vec::new();
        for name in names {
            match RegexBuilder::new(&name_pattern(name))
                .case_insensitive(true)
                .build()
            {
                Ok(re) => patterns.push((name.to_string(), re)),
                Err(e) => log::warn!("Skipping unmatchable satellite name {:?}: {}", name, e),
            }
        }
        Self { patterns }
    }

    /// First candidate, in the order given at construction, found in `text`.
    pub fn find(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

fn name_pattern(name: &str) -> String {
    let body = name
        .split([' ', '-'])
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[ -]");
    format!(r"\b{}\b", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_and_hyphen_are_interchangeable() {
        let matcher = NameMatcher::new(["LANDSAT 5"]);
        assert_eq!(matcher.find("where is landsat-5 now?"), Some("LANDSAT 5"));
        assert_eq!(matcher.find("LANDSAT 5 please"), Some("LANDSAT 5"));

        let hyphenated = NameMatcher::new(["SO-50"]);
        assert_eq!(hyphenated.find("so 50 pass tonight"), Some("SO-50"));
    }

    #[test]
    fn requires_word_boundaries() {
        let matcher = NameMatcher::new(["ISS"]);
        assert_eq!(matcher.find("@WheresThatSat ISS?"), Some("ISS"));
        assert_eq!(matcher.find("I miss you"), None);
        assert_eq!(matcher.find("the mission"), None);
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let matcher = NameMatcher::new(["NOAA 1+"]);
        assert_eq!(matcher.find("NOAA 11"), None);
        assert_eq!(NameMatcher::new(["A.B"]).find("AxB"), None);
    }

    #[test]
    fn first_candidate_in_order_wins() {
        let matcher = NameMatcher::new(["HUBBLE", "ISS"]);
        assert_eq!(matcher.find("ISS or Hubble?"), Some("HUBBLE"));
        assert_eq!(matcher.len(), 2);
    }
}
