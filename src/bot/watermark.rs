use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bot::error::StateError;
use crate::bot::orchestrator::RunReport;
use crate::bot::transport::Category;

/// Highest message id handled per watermarked category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermarks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions_since_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dm_since_id: Option<u64>,
}

impl Watermarks {
    pub fn load(path: &Path) -> Result<Self, StateError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn get(&self, category: Category) -> Option<u64> {
        match category {
            Category::Mentions => self.mentions_since_id,
            Category::DirectMessages => self.dm_since_id,
            Category::Searches => None,
        }
    }

    /// Move a category's watermark forward; never backwards.
    pub fn advance(&mut self, category: Category, id: u64) {
        let slot = match category {
            Category::Mentions => &mut self.mentions_since_id,
            Category::DirectMessages => &mut self.dm_since_id,
            Category::Searches => return,
        };
        *slot = Some(slot.map_or(id, |current| current.max(id)));
    }

    pub fn apply(&mut self, report: &RunReport) {
        for (category, outcome) in &report.outcomes {
            if let Some(id) = outcome.watermark {
                self.advance(*category, id);
            }
        }
    }
}
