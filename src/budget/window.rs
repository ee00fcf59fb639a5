use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::budget::error::BudgetError;
use crate::budget::lock::BudgetLock;

/// Number of per-run counts kept; six ten-minute runs make an hour.
pub const WINDOW_LEN: usize = 6;

/// API calls consumed by the most recent runs, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetWindow {
    #[serde(default)]
    intervals: Vec<u32>,
}

impl BudgetWindow {
    pub fn new(intervals: Vec<u32>) -> Self {
        let mut window = Self { intervals };
        window.trim();
        window
    }

    fn trim(&mut self) {
        let excess = self.intervals.len().saturating_sub(WINDOW_LEN);
        self.intervals.drain(..excess);
    }

    pub fn push(&mut self, calls: u32) {
        self.intervals.push(calls);
        self.trim();
    }

    pub fn total(&self) -> u32 {
        self.intervals.iter().sum()
    }

    pub fn intervals(&self) -> &[u32] {
        &self.intervals
    }
}

/// Tracks the rolling call window on disk. Holds the budget lock for as long
/// as it lives, so a whole run is one read-modify-write.
pub struct CallBudgetManager {
    path: PathBuf,
    window: BudgetWindow,
    _lock: BudgetLock,
}

impl CallBudgetManager {
    pub fn open(path: impl Into<PathBuf>, lock_wait: Duration) -> Result<Self, BudgetError> {
        let path = path.into();
        let lock = BudgetLock::acquire(&path, lock_wait)?;
        let window = load_window(&path)?;
        log::debug!(
            "Budget window {:?} (total {})",
            window.intervals(),
            window.total()
        );
        Ok(Self {
            path,
            window,
            _lock: lock,
        })
    }

    /// Calls still allowed this hour under `cap`.
    pub fn available(&self, cap: u32) -> u32 {
        cap.saturating_sub(self.window.total())
    }

    /// Append this run's consumption, drop the oldest run if the window is
    /// full, and persist. Returns the new total.
    pub fn record(&mut self, consumed: u32) -> Result<u32, BudgetError> {
        self.window.push(consumed);
        fs::write(&self.path, serde_yaml::to_string(&self.window)?)?;
        Ok(self.window.total())
    }

    #[cfg(test)]
    pub fn window(&self) -> &BudgetWindow {
        &self.window
    }
}

fn load_window(path: &Path) -> Result<BudgetWindow, BudgetError> {
    if !path.exists() {
        return Ok(BudgetWindow::default());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(BudgetWindow::default());
    }
    let window: BudgetWindow = serde_yaml::from_str(&content)?;
    Ok(BudgetWindow::new(window.intervals))
}
