use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::bot::{BotSettings, Gazetteer, TransportError};
use crate::track::{ProcessPropagator, PropagationPort, Sgp4Propagator};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("gazetteer: {0}")]
    Gazetteer(#[from] TransportError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub account: String,
    pub catalog: PathBuf,
    pub budget: BudgetConfig,
    #[serde(default)]
    pub propagator: PropagatorConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub searches: SearchesConfig,
    pub transport: TransportConfig,
    pub state: PathBuf,
    pub gazetteer: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    pub state: PathBuf,
    #[serde(default = "default_hourly_cap")]
    pub hourly_cap: u32,
    #[serde(default = "default_search_quota")]
    pub search_quota: u32,
    /// How long to wait for another run's lock, e.g. `10s`.
    #[serde(default = "default_lock_wait")]
    pub lock_wait: String,
}

fn default_hourly_cap() -> u32 {
    150
}

fn default_search_quota() -> u32 {
    20
}

fn default_lock_wait() -> String {
    "0s".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Process,
    Sgp4,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropagatorConfig {
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Arguments placed before the query, e.g. when `program` is an interpreter.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout")]
    pub timeout: String,
    #[serde(default = "default_trace_interval")]
    pub trace_interval: String,
    #[serde(default)]
    pub backend: Backend,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            timeout: default_timeout(),
            trace_interval: default_trace_interval(),
            backend: Backend::default(),
        }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("./gtg")
}

fn default_timeout() -> String {
    "30s".to_string()
}

fn default_trace_interval() -> String {
    "1m".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://wheresthatsat.com/map.html".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchesConfig {
    #[serde(default)]
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    pub spool: PathBuf,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.account.trim().is_empty() || self.account.starts_with('@') {
            return Err(ConfigError::Invalid {
                field: "account",
                message: format!("expected a bare handle, got {:?}", self.account),
            });
        }
        if self.trace_interval()?.is_zero() {
            return Err(ConfigError::Invalid {
                field: "propagator.trace_interval",
                message: "must be positive".to_string(),
            });
        }
        self.timeout()?;
        self.lock_wait()?;
        Ok(())
    }

    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration("propagator.timeout", &self.propagator.timeout)
    }

    pub fn trace_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration("propagator.trace_interval", &self.propagator.trace_interval)
    }

    pub fn lock_wait(&self) -> Result<Duration, ConfigError> {
        parse_duration("budget.lock_wait", &self.budget.lock_wait)
    }

    pub fn propagator(&self) -> Result<Box<dyn PropagationPort>, ConfigError> {
        Ok(match self.propagator.backend {
            Backend::Process => Box::new(ProcessPropagator::new(
                &self.propagator.program,
                self.propagator.args.clone(),
                self.timeout()?,
            )),
            Backend::Sgp4 => Box::new(Sgp4Propagator),
        })
    }

    pub fn gazetteer(&self) -> Result<Gazetteer, ConfigError> {
        match &self.gazetteer {
            Some(path) => Ok(Gazetteer::load(path)?),
            None => Ok(Gazetteer::empty()),
        }
    }

    pub fn bot_settings(&self, dry_run: bool) -> BotSettings {
        BotSettings {
            account: self.account.clone(),
            search_quota: self.budget.search_quota,
            search_terms: self.searches.terms.clone(),
            dry_run,
        }
    }
}

fn parse_duration(field: &'static str, s: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(s.trim()).map_err(|e| ConfigError::Invalid {
        field,
        message: format!("{:?}: {}", s, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
account: WheresThatSat
catalog: data/catalog.yml
budget:
  state: data/intervals.yml
transport:
  spool: data/spool
state: data/state.yml
";

    #[test]
    fn defaults_fill_optional_sections() {
        let config = Config::from_str(MINIMAL).unwrap();
        assert_eq!(config.budget.hourly_cap, 150);
        assert_eq!(config.budget.search_quota, 20);
        assert_eq!(config.propagator.program, PathBuf::from("./gtg"));
        assert_eq!(config.propagator.backend, Backend::Process);
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(config.trace_interval().unwrap(), Duration::from_secs(60));
        assert_eq!(config.lock_wait().unwrap(), Duration::ZERO);
        assert_eq!(config.map.base_url, "http://wheresthatsat.com/map.html");
        assert!(config.searches.terms.is_empty());
        assert!(config.gazetteer.is_none());
    }

    #[test]
    fn full_config() {
        let yaml = format!(
            "{MINIMAL}propagator:\n  backend: sgp4\n  trace_interval: 30s\nsearches:\n  terms: [ISS, HST]\n"
        );
        let config = Config::from_str(&yaml).unwrap();
        assert_eq!(config.propagator.backend, Backend::Sgp4);
        assert_eq!(config.trace_interval().unwrap(), Duration::from_secs(30));

        let settings = config.bot_settings(true);
        assert_eq!(settings.search_terms, ["ISS", "HST"]);
        assert!(settings.dry_run);
    }

    #[test]
    fn rejects_bad_values() {
        let bad_account = MINIMAL.replace("WheresThatSat", "'@WheresThatSat'");
        assert!(matches!(
            Config::from_str(&bad_account),
            Err(ConfigError::Invalid { field: "account", .. })
        ));

        let bad_timeout = format!("{MINIMAL}propagator:\n  timeout: soon\n");
        assert!(matches!(
            Config::from_str(&bad_timeout),
            Err(ConfigError::Invalid {
                field: "propagator.timeout",
                ..
            })
        ));
    }
}
